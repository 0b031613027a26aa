//! Bridge between a Beat Saber status stream and a MIDI output port.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::bounded;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use saber_midi::config::DEFAULT_CONFIG_FILE;
use saber_midi::source::{self, Source};
use saber_midi::{BridgeConfig, MidiOutputCollector, MidiSink, Monitor};

#[derive(Parser, Debug)]
#[command(name = "saber-midi", version, about)]
struct Args {
    /// JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Substring of the MIDI output port name
    #[arg(long)]
    midi_port: Option<String>,
    /// Websocket endpoint of the game's status server
    #[arg(long)]
    url: Option<String>,
    /// Replay line-delimited messages from a file, or `-` for stdin
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Directory for the song index and session archives
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Print the available MIDI output ports and exit
    #[arg(long)]
    list_devices: bool,
    /// Record MIDI in memory instead of opening a port
    #[arg(long)]
    dry_run: bool,
    /// Do not write the archive
    #[arg(long)]
    no_archive: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.list_devices {
        return list_devices();
    }

    let mut config = BridgeConfig::load(&args.config)?;
    if let Some(port) = args.midi_port {
        config.midi_port = port;
    }
    if let Some(url) = args.url {
        config.url = url;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if args.no_archive {
        config.archive = false;
    }

    let collector = args.dry_run.then(|| Arc::new(MidiOutputCollector::new()));
    let sink: Arc<dyn MidiSink> = match &collector {
        Some(collector) => collector.clone(),
        None => open_device(&config.midi_port)?,
    };

    let source = match args.replay {
        Some(path) => Source::replay(path),
        None => live_source(&config.url)?,
    };

    let mut monitor = Monitor::builder(sink).config(config).build();
    let handle = source::spawn(source).context("failed to start message source")?;

    let (stop_tx, stop_rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    let summary = source::run(&mut monitor, handle.frames(), &stop_rx);
    info!(
        dispatched = summary.dispatched,
        malformed = summary.malformed,
        interrupted = summary.interrupted,
        "done"
    );
    if let Some(collector) = collector {
        info!(messages = collector.len(), "dry run recorded MIDI");
    }
    Ok(())
}

#[cfg(feature = "midi-hardware")]
fn open_device(name: &str) -> anyhow::Result<Arc<dyn MidiSink>> {
    let manager = saber_midi::MidiOutputManager::connect_by_name(name)
        .map_err(saber_midi::Error::DeviceUnavailable)?;
    info!(device = manager.device_name(), "MIDI output ready");
    Ok(Arc::new(manager))
}

#[cfg(not(feature = "midi-hardware"))]
fn open_device(_name: &str) -> anyhow::Result<Arc<dyn MidiSink>> {
    anyhow::bail!("built without MIDI hardware support, use --dry-run")
}

#[cfg(feature = "midi-hardware")]
fn list_devices() -> anyhow::Result<()> {
    let devices = saber_midi::MidiOutputManager::list_devices()?;
    if devices.is_empty() {
        println!("no MIDI output ports");
    }
    for device in devices {
        println!("{}: {}", device.index, device.name);
    }
    Ok(())
}

#[cfg(not(feature = "midi-hardware"))]
fn list_devices() -> anyhow::Result<()> {
    anyhow::bail!("built without MIDI hardware support")
}

#[cfg(feature = "websocket")]
fn live_source(url: &str) -> anyhow::Result<Source> {
    Ok(Source::WebSocket(url.to_string()))
}

#[cfg(not(feature = "websocket"))]
fn live_source(_url: &str) -> anyhow::Result<Source> {
    anyhow::bail!("built without websocket support, use --replay")
}
