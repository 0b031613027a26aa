//! Per-map session recording.
//!
//! While a map is being played every message (minus its `status`) is logged.
//! When the map ends the log is closed into a record together with the final
//! snapshots, the map is added to a song index keyed by a content hash, and
//! both documents are rewritten on disk.
//!
//! Layout of the data directory:
//! - `songs.json`: object mapping content hash to beatmap metadata
//! - `session<YYYYMMDD_HHMMSS>.json`: array of records for one run

use crate::error::{Error, ProcessorError, Result};
use crate::message::{Beatmap, Event, Message, Performance};
use crate::processor::{Outcome, ProcessResult, Processor};
use crate::state::SessionState;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SONGS_FILE: &str = "songs.json";

/// Hash used when a map ends without any beatmap snapshot.
pub const UNKNOWN_MAP: &str = "unknown";

/// One finished map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub map_hash: String,
    pub events: Vec<Value>,
    #[serde(default)]
    pub performance: Option<Performance>,
    #[serde(rename = "mod", default)]
    pub modifiers: Option<Value>,
    #[serde(rename = "playerSettings", default)]
    pub player_settings: Option<Value>,
    #[serde(default)]
    pub game: Option<Value>,
}

/// Content hash of a map.
///
/// Covers the level id together with difficulty and characteristic, since one
/// level id is shared by every difficulty of a song. Maps without a level id
/// fall back to their names.
pub fn map_hash(beatmap: &Beatmap) -> String {
    let identity = match &beatmap.level_id {
        Some(id) => id.clone(),
        None => [
            beatmap.song_name.as_deref(),
            beatmap.song_author_name.as_deref(),
            beatmap.level_author_name.as_deref(),
        ]
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("/"),
    };
    let mut hasher = blake3::Hasher::new();
    for part in [
        identity.as_str(),
        beatmap.difficulty.as_deref().unwrap_or_default(),
        beatmap.characteristic.as_deref().unwrap_or_default(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Recording processor backed by two JSON documents.
pub struct SongArchive {
    songs_path: PathBuf,
    session_path: PathBuf,
    songs: BTreeMap<String, Beatmap>,
    sessions: Vec<ArchiveRecord>,
    current: Vec<Value>,
    dirty: bool,
}

impl SongArchive {
    /// Archive in `data_dir` with a session file named after the current time.
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        Self::with_paths(
            data_dir.join(SONGS_FILE),
            data_dir.join(format!("session{stamp}.json")),
        )
    }

    /// Existing documents at either path are loaded; unreadable ones are
    /// logged and start empty.
    pub fn with_paths(songs_path: impl Into<PathBuf>, session_path: impl Into<PathBuf>) -> Self {
        let songs_path = songs_path.into();
        let session_path = session_path.into();
        let songs = load_or_default(&songs_path);
        let sessions = load_or_default(&session_path);
        Self {
            songs_path,
            session_path,
            songs,
            sessions,
            current: Vec::new(),
            dirty: false,
        }
    }

    pub fn songs(&self) -> &BTreeMap<String, Beatmap> {
        &self.songs
    }

    pub fn sessions(&self) -> &[ArchiveRecord] {
        &self.sessions
    }

    /// Events logged so far for the map in progress.
    pub fn current(&self) -> &[Value] {
        &self.current
    }

    /// Whether finished records have not reached disk yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn songs_path(&self) -> &Path {
        &self.songs_path
    }

    /// Rewrite both documents if anything changed since the last success.
    ///
    /// On failure all records stay in memory and the archive stays dirty.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        write_json_atomic(&self.songs_path, &self.songs)?;
        write_json_atomic(&self.session_path, &self.sessions)?;
        self.dirty = false;
        info!(path = %self.session_path.display(), records = self.sessions.len(), "saved archive");
        Ok(())
    }

    fn finish_map(&mut self, state: &SessionState, terminal: &Message) {
        if self.current.is_empty() {
            debug!("map ended with nothing recorded");
            return;
        }
        let entry = terminal.entry();
        if self.current.last() != Some(&entry) {
            self.current.push(entry);
        }

        let map_hash = match &state.beatmap {
            Some(beatmap) => {
                let hash = map_hash(beatmap);
                self.songs
                    .entry(hash.clone())
                    .or_insert_with(|| beatmap.clone());
                hash
            }
            None => UNKNOWN_MAP.to_string(),
        };

        let events = std::mem::take(&mut self.current);
        info!(map_hash = %map_hash, events = events.len(), "song finished, archiving");
        self.sessions.push(ArchiveRecord {
            map_hash,
            events,
            performance: state.performance.clone(),
            modifiers: state.modifiers.clone(),
            player_settings: state.player_settings.clone(),
            game: state.game.clone(),
        });
        self.dirty = true;

        if let Err(e) = self.flush() {
            warn!(error = %e, "archive flush failed, keeping records for retry");
        }
    }
}

impl Processor for SongArchive {
    fn process(&mut self, state: &SessionState, message: &Message) -> ProcessResult {
        if message.event == Event::Hello {
            return Ok(Outcome::Suppress);
        }
        if message.event.is_abort() {
            self.finish_map(state, message);
            self.current.clear();
            return Ok(Outcome::Suppress);
        }
        if message.event == Event::SongStart && !self.current.is_empty() {
            warn!(events = self.current.len(), "map started before the last one ended, discarding its log");
            self.current.clear();
        }
        if state.in_map {
            self.current.push(message.entry());
        }
        Ok(Outcome::Pass)
    }

    fn shutdown(&mut self) -> std::result::Result<(), ProcessorError> {
        self.flush().map_err(|e| ProcessorError::Other(e.to_string()))
    }
}

impl fmt::Display for SongArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Complete message archive per song writing to {}",
            self.session_path.display()
        )
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "archive load failed");
            return T::default();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        // Keep the unreadable file out of the way of the next flush
        let aside = path.with_extension("json.bad");
        match fs::rename(path, &aside) {
            Ok(()) => warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "unreadable archive file set aside"
            ),
            Err(rename_err) => warn!(
                path = %path.display(),
                error = %e,
                rename_error = %rename_err,
                "unreadable archive file could not be set aside"
            ),
        }
        T::default()
    })
}

/// Write, fsync, then rename over the destination.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let persist_err = |source: io::Error| Error::Persistence {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(persist_err)?;
    }
    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path).map_err(persist_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .map_err(io::Error::from)
        .map_err(persist_err)?;
    writer.flush().map_err(persist_err)?;
    writer.get_ref().sync_all().map_err(persist_err)?;
    fs::rename(&temp_path, path).map_err(persist_err)?;
    Ok(())
}
