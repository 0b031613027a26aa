//! Shared registry of currently sounding output notes.

use crate::note::{NoteId, OutputNote};
use crate::sink::MidiSink;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Active notes plus the device they were started on.
///
/// One registry is shared (via `Arc`) by every note-emitting processor of a
/// monitor, so a gate or a cleanup step can stop notes it did not start.
/// At most one live note exists per id.
pub struct NoteRegistry {
    sink: Arc<dyn MidiSink>,
    notes: Mutex<Vec<OutputNote>>,
}

impl NoteRegistry {
    pub fn new(sink: Arc<dyn MidiSink>) -> Self {
        Self {
            sink,
            notes: Mutex::new(Vec::new()),
        }
    }

    pub fn sink(&self) -> &Arc<dyn MidiSink> {
        &self.sink
    }

    /// Track `note`, sending its start command when `play` is set.
    ///
    /// A live note with the same id is stopped and replaced first.
    pub fn add(&self, note: OutputNote, play: bool) {
        let mut notes = self.notes.lock();
        if let Some(id) = &note.id {
            if let Some(pos) = notes.iter().position(|n| n.id.as_ref() == Some(id)) {
                warn!(note_id = %id, "note already active, replacing");
                let old = notes.remove(pos);
                self.sink.send(&old.stop);
            }
        }
        if play {
            self.sink.send(&note.start);
        }
        notes.push(note);
    }

    /// Stop and forget the note with `id`. Returns `false` if none was active.
    pub fn single_off(&self, id: &NoteId) -> bool {
        let mut notes = self.notes.lock();
        match notes.iter().position(|n| n.id.as_ref() == Some(id)) {
            Some(pos) => {
                let note = notes.remove(pos);
                debug!(note_id = %id, "stopping note");
                self.sink.send(&note.stop);
                true
            }
            None => false,
        }
    }

    /// Stop every active note and clear the registry. Returns how many were stopped.
    pub fn all_off(&self) -> usize {
        let stopped: Vec<OutputNote> = self.notes.lock().drain(..).collect();
        for note in &stopped {
            self.sink.send(&note.stop);
        }
        if !stopped.is_empty() {
            debug!(count = stopped.len(), "all notes off");
        }
        stopped.len()
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.notes.lock().iter().any(|n| n.id.as_ref() == Some(id))
    }

    pub fn get(&self, id: &NoteId) -> Option<OutputNote> {
        self.notes
            .lock()
            .iter()
            .find(|n| n.id.as_ref() == Some(id))
            .cloned()
    }

    pub fn ids(&self) -> Vec<NoteId> {
        self.notes.lock().iter().filter_map(|n| n.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.notes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.lock().is_empty()
    }
}

impl std::fmt::Debug for NoteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteRegistry")
            .field("notes", &*self.notes.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_collector::MidiOutputCollector;

    fn registry() -> (Arc<MidiOutputCollector>, NoteRegistry) {
        let collector = Arc::new(MidiOutputCollector::new());
        let registry = NoteRegistry::new(collector.clone());
        (collector, registry)
    }

    #[test]
    fn test_add_and_single_off() {
        let (out, reg) = registry();
        reg.add(OutputNote::new("a", 0, 60, 100), true);
        assert!(reg.contains(&"a".into()));
        assert_eq!(out.len(), 1);

        assert!(reg.single_off(&"a".into()));
        assert!(reg.is_empty());
        let sent = out.messages();
        assert!(sent[1].is_note_off());
        assert_eq!(sent[1].note(), Some(60));
    }

    #[test]
    fn test_add_without_play_is_silent() {
        let (out, reg) = registry();
        reg.add(OutputNote::new("a", 0, 60, 100), false);
        assert_eq!(reg.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_off_unknown_is_noop() {
        let (out, reg) = registry();
        assert!(!reg.single_off(&"missing".into()));
        assert!(out.is_empty());
    }

    #[test]
    fn test_duplicate_id_replaces() {
        let (out, reg) = registry();
        reg.add(OutputNote::new("gate", 3, 60, 100), true);
        reg.add(OutputNote::new("gate", 3, 62, 100), true);

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&"gate".into()).unwrap().pitch(), Some(62));
        let sent = out.messages();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].is_note_off());
        assert_eq!(sent[1].note(), Some(60));
    }

    #[test]
    fn test_all_off_stops_everything() {
        let (out, reg) = registry();
        reg.add(OutputNote::new("a", 0, 60, 100), true);
        reg.add(OutputNote::anonymous(1, 61, 100), true);
        out.drain_all();

        assert_eq!(reg.all_off(), 2);
        assert!(reg.is_empty());
        assert!(out.messages().iter().all(|m| m.is_note_off()));
        assert_eq!(reg.all_off(), 0);
    }
}
