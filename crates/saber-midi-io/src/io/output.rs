//! MIDI output: device enumeration, connection, and message sending via a dedicated thread.

use crate::error::{Error, Result};
use crate::message::MidiOutputMessage;
use crate::sink::MidiSink;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use midir::{MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "saber-midi-output";
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct MidiOutputDevice {
    pub index: usize,
    pub name: String,
}

enum MidiOutputCommand {
    Send(MidiOutputMessage),
    SendAt(MidiOutputMessage, Instant),
    Shutdown,
}

/// MIDI output manager bound to one device for its whole lifetime.
///
/// The connection lives on its own thread; `send_after` messages are held there
/// until due, so callers never sleep. Pending delayed messages are flushed
/// immediately on shutdown so no note is left sounding.
pub struct MidiOutputManager {
    command_sender: Sender<MidiOutputCommand>,
    device_name: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MidiOutputManager {
    /// Resolve a device by case-insensitive substring match and connect to it.
    pub fn connect_by_name(name: &str) -> Result<Self> {
        let devices = Self::list_devices()?;
        let needle = name.to_lowercase();
        let device = devices
            .iter()
            .find(|d| d.name.to_lowercase().contains(&needle))
            .ok_or_else(|| Error::DeviceNotFound {
                name: name.to_string(),
                available: devices.iter().map(|d| d.name.clone()).collect(),
            })?;
        Self::connect(device.index)
    }

    pub fn connect(device_index: usize) -> Result<Self> {
        let (command_sender, command_receiver) = bounded(1024);
        let (ready_tx, ready_rx) = bounded::<Result<String>>(1);

        let worker = thread::Builder::new()
            .name("midi-output-thread".to_string())
            .spawn(move || match Self::connect_to_device(device_index) {
                Ok((conn, name)) => {
                    let _ = ready_tx.send(Ok(name));
                    Self::midi_output_thread(conn, command_receiver);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| Error::MidiDevice(format!("failed to spawn MIDI output thread: {e}")))?;

        let device_name = ready_rx
            .recv()
            .map_err(|_| Error::OutputThreadStopped)??;
        info!(device = %device_name, "connected MIDI output");

        Ok(Self {
            command_sender,
            device_name,
            worker: Mutex::new(Some(worker)),
        })
    }

    fn midi_output_thread(
        mut connection: MidiOutputConnection,
        command_receiver: Receiver<MidiOutputCommand>,
    ) {
        let mut delayed: Vec<(Instant, MidiOutputMessage)> = Vec::new();

        loop {
            let timeout = delayed
                .iter()
                .map(|(due, _)| due.saturating_duration_since(Instant::now()))
                .min()
                .unwrap_or(IDLE_POLL);

            match command_receiver.recv_timeout(timeout) {
                Ok(MidiOutputCommand::Send(msg)) => {
                    Self::write(&mut connection, &msg);
                }
                Ok(MidiOutputCommand::SendAt(msg, due)) => {
                    delayed.push((due, msg));
                }
                Ok(MidiOutputCommand::Shutdown)
                | Err(RecvTimeoutError::Disconnected) => {
                    delayed.sort_by_key(|(due, _)| *due);
                    for (_, msg) in delayed.drain(..) {
                        Self::write(&mut connection, &msg);
                    }
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            delayed.sort_by_key(|(due, _)| *due);
            let ready = delayed.iter().take_while(|(due, _)| *due <= now).count();
            for (_, msg) in delayed.drain(..ready) {
                Self::write(&mut connection, &msg);
            }
        }
        connection.close();
    }

    fn write(connection: &mut MidiOutputConnection, msg: &MidiOutputMessage) {
        if let Err(e) = connection.send(&msg.bytes) {
            warn!("MIDI send failed: {}", e);
        }
    }

    fn connect_to_device(device_index: usize) -> Result<(MidiOutputConnection, String)> {
        let midi_output = MidiOutput::new(CLIENT_NAME)?;

        let ports = midi_output.ports();
        let port = ports.get(device_index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output device {} not found", device_index))
        })?;

        let port_name = midi_output
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_output.connect(port, "saber-midi-output")?;

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Result<Vec<MidiOutputDevice>> {
        let midi_output = MidiOutput::new("saber-midi-device-list")?;
        let devices = midi_output
            .ports()
            .iter()
            .enumerate()
            .map(|(index, port)| MidiOutputDevice {
                index,
                name: midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index)),
            })
            .collect();
        Ok(devices)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn command(&self, command: MidiOutputCommand) {
        if self.command_sender.send(command).is_err() {
            debug!("MIDI output thread gone, message dropped");
        }
    }
}

impl MidiSink for MidiOutputManager {
    fn send(&self, message: &MidiOutputMessage) {
        self.command(MidiOutputCommand::Send(message.clone()));
    }

    fn send_after(&self, message: MidiOutputMessage, delay: Duration) {
        self.command(MidiOutputCommand::SendAt(message, Instant::now() + delay));
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiOutputCommand::Shutdown);
        if let Some(worker) = self.worker.get_mut().take() {
            let _ = worker.join();
        }
    }
}
