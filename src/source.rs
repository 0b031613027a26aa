//! Message sources and the host loop that feeds the monitor.
//!
//! A reader thread pushes raw text frames into a bounded channel. The host
//! loop on the calling thread is the only consumer, so the monitor is never
//! dispatched from two threads at once.

use crate::error::{Error, Result};
use crate::monitor::Monitor;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Frames buffered between the reader and the monitor.
const CHANNEL_CAPACITY: usize = 1024;

/// Where raw messages come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Live game telemetry.
    #[cfg(feature = "websocket")]
    WebSocket(String),
    /// One JSON message per line. `None` reads stdin.
    Lines(Option<PathBuf>),
}

impl Source {
    /// `-` selects stdin.
    pub fn replay(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str() == "-" {
            Source::Lines(None)
        } else {
            Source::Lines(Some(path))
        }
    }
}

/// Running reader thread and its frame channel.
pub struct SourceHandle {
    frames: Receiver<String>,
    thread: Option<JoinHandle<()>>,
}

impl SourceHandle {
    pub fn frames(&self) -> &Receiver<String> {
        &self.frames
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        // A reader blocked on the network is left detached.
        if let Some(thread) = self.thread.take() {
            if thread.is_finished() {
                let _ = thread.join();
            }
        }
    }
}

/// Start reading `source` on its own thread. Files are opened up front so a
/// bad path fails here rather than as an empty stream.
pub fn spawn(source: Source) -> Result<SourceHandle> {
    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    let thread = match source {
        #[cfg(feature = "websocket")]
        Source::WebSocket(url) => thread::Builder::new()
            .name("saber-ws".to_string())
            .spawn(move || read_websocket(&url, tx))?,
        Source::Lines(Some(path)) => {
            let file = File::open(&path).map_err(|e| Error::Stream(format!("{}: {e}", path.display())))?;
            thread::Builder::new()
                .name("saber-replay".to_string())
                .spawn(move || read_lines(BufReader::new(file), tx))?
        }
        Source::Lines(None) => thread::Builder::new()
            .name("saber-stdin".to_string())
            .spawn(move || read_lines(io::stdin().lock(), tx))?,
    };
    Ok(SourceHandle {
        frames: rx,
        thread: Some(thread),
    })
}

fn read_lines(reader: impl BufRead, tx: Sender<String>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "replay read failed");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(line).is_err() {
            return;
        }
    }
    debug!("replay exhausted");
}

#[cfg(feature = "websocket")]
fn read_websocket(url: &str, tx: Sender<String>) {
    use tungstenite::Message as Frame;

    let mut socket = match tungstenite::connect(url) {
        Ok((socket, _)) => socket,
        Err(e) => {
            error!(url, error = %e, "websocket connect failed");
            return;
        }
    };
    info!(url, "websocket connected");

    loop {
        let text = match socket.read() {
            Ok(Frame::Text(text)) => text,
            Ok(Frame::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!("dropping non UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Frame::Close(frame)) => {
                info!(?frame, "websocket closed by peer");
                return;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "websocket read failed");
                return;
            }
        };
        if tx.send(text).is_err() {
            let _ = socket.close(None);
            return;
        }
    }
}

/// What the host loop saw before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatched: usize,
    pub malformed: usize,
    pub interrupted: bool,
}

/// Dispatch frames until the source ends or `stop` fires, then shut the
/// monitor down.
pub fn run(monitor: &mut Monitor, frames: &Receiver<String>, stop: &Receiver<()>) -> RunSummary {
    let mut summary = RunSummary::default();
    loop {
        select! {
            recv(frames) -> frame => match frame {
                Ok(text) => match monitor.dispatch(&text) {
                    Ok(_) => summary.dispatched += 1,
                    Err(e) => {
                        warn!(error = %e, "dropping message");
                        summary.malformed += 1;
                    }
                },
                Err(_) => {
                    info!("message stream ended");
                    break;
                }
            },
            recv(stop) -> _ => {
                info!("interrupted");
                summary.interrupted = true;
                break;
            }
        }
    }
    monitor.shutdown();
    summary
}
