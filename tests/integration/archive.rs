//! Session records and the song index on disk.

use crate::helpers::{archive_bridge, event, note_cut, score_changed, song_start};
use saber_midi::archive::SONGS_FILE;
use saber_midi::{ArchiveRecord, Beatmap};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_sessions(path: &Path) -> Vec<ArchiveRecord> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn read_songs(dir: &TempDir) -> BTreeMap<String, Beatmap> {
    serde_json::from_str(&fs::read_to_string(dir.path().join(SONGS_FILE)).unwrap()).unwrap()
}

#[test]
fn test_empty_map_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut b = archive_bridge(&dir, "session.json");

    b.send(song_start("level", "Song", 120.0));
    b.send(event("finished"));

    assert!(!dir.path().join("session.json").exists());
    assert!(!dir.path().join(SONGS_FILE).exists());
}

#[test]
fn test_played_map_writes_one_record() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let mut b = archive_bridge(&dir, "session.json");

    b.send(event("hello"));
    b.send(song_start("level", "Song", 120.0));
    b.send(note_cut("1", "NoteA", 80.0, 12.0));
    b.send(score_changed(115, 115, 1, 1));
    b.send(event("finished"));

    let records = read_sessions(&session);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.events.len(), 3);
    assert_eq!(record.events[0]["event"], "noteCut");
    assert_eq!(record.events[0]["noteCut"]["noteID"], "1");
    assert_eq!(record.events[2]["event"], "finished");
    assert!(record.events.iter().all(|e| e.get("status").is_none()));
    assert_eq!(record.performance.as_ref().unwrap().score, Some(115));
    assert!(record.modifiers.is_some());
    assert!(record.player_settings.is_some());
    assert!(record.game.is_some());

    let songs = read_songs(&dir);
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[&record.map_hash].song_name.as_deref(), Some("Song"));
}

#[test]
fn test_records_accumulate_per_session() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let mut b = archive_bridge(&dir, "session.json");

    for (level, end) in [("a", "finished"), ("b", "failed"), ("c", "menu")] {
        b.send(song_start(level, level, 100.0));
        b.send(event("bombCut"));
        b.send(event(end));
    }

    let records = read_sessions(&session);
    assert_eq!(records.len(), 3);
    let ends: Vec<_> = records
        .iter()
        .map(|r| r.events.last().unwrap()["event"].clone())
        .collect();
    assert_eq!(ends, vec!["finished", "failed", "menu"]);
    assert_eq!(read_songs(&dir).len(), 3);
}

#[test]
fn test_song_index_keeps_first_seen() {
    let dir = TempDir::new().unwrap();

    let mut first = archive_bridge(&dir, "session1.json");
    first.send(song_start("same-level", "Original title", 120.0));
    first.send(event("noteMissed"));
    first.send(event("finished"));
    first.monitor.shutdown();

    let mut second = archive_bridge(&dir, "session2.json");
    second.send(song_start("same-level", "Renamed title", 120.0));
    second.send(event("noteMissed"));
    second.send(event("finished"));
    second.monitor.shutdown();

    let songs = read_songs(&dir);
    assert_eq!(songs.len(), 1);
    let beatmap = songs.values().next().unwrap();
    assert_eq!(beatmap.song_name.as_deref(), Some("Original title"));

    assert_eq!(read_sessions(&dir.path().join("session1.json")).len(), 1);
    assert_eq!(read_sessions(&dir.path().join("session2.json")).len(), 1);
}

#[test]
fn test_shutdown_mid_map_closes_record() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let mut b = archive_bridge(&dir, "session.json");

    b.send(song_start("level", "Song", 120.0));
    b.send(event("obstacleEnter"));
    b.monitor.shutdown();

    let records = read_sessions(&session);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].events.last().unwrap()["event"], "menu");
}
