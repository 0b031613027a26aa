//! Block-cut notes, gates, and the shared registry.

use crate::helpers::{bridge, event, note_cut, note_fully_cut, song_start};
use saber_midi::processors::{cut_pitch, cut_velocity};
use saber_midi::NoteId;
use serde_json::json;

#[test]
fn test_cut_then_full_cut() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    let before = b.registry().len();

    b.send(note_cut("a", "NoteA", 85.0, 0.0));
    let note = b
        .registry()
        .get(&NoteId::from("a"))
        .expect("note a should be live");
    assert_eq!(note.pitch(), Some(86));
    assert_eq!(note.channel(), Some(1));
    assert_eq!(b.registry().len(), before + 1);

    b.send(note_fully_cut("a"));
    assert!(!b.registry().contains(&NoteId::from("a")));
    assert_eq!(b.registry().len(), before);
}

#[test]
fn test_interleaved_cuts_are_independent() {
    let mut b = bridge();
    b.send(note_cut("1", "NoteA", 70.0, 15.0));
    b.send(note_cut("2", "NoteB", 30.0, 5.0));
    b.send(note_cut("3", "Bomb", 0.0, 0.0));

    let ids = [("1", 70.0, 15.0, 1), ("2", 30.0, 5.0, 0), ("3", 0.0, 0.0, 15)];
    for (id, initial, distance, channel) in ids {
        let note = b.registry().get(&NoteId::from(id)).unwrap();
        assert_eq!(note.pitch(), Some(cut_pitch(initial)));
        assert_eq!(note.velocity(), Some(cut_velocity(distance)));
        assert_eq!(note.channel(), Some(channel));
    }

    b.send(note_fully_cut("2"));
    assert!(b.registry().contains(&NoteId::from("1")));
    assert!(!b.registry().contains(&NoteId::from("2")));
    assert!(b.registry().contains(&NoteId::from("3")));
}

#[test]
fn test_numeric_note_id_matches_string() {
    let mut b = bridge();
    b.send(json!({
        "event": "noteCut",
        "noteCut": { "noteID": 42, "noteType": "NoteB", "initialScore": 40, "cutDistanceScore": 10 }
    }));
    assert!(b.registry().contains(&NoteId::from("42")));

    b.send(note_fully_cut("42"));
    assert!(b.registry().is_empty());
}

#[test]
fn test_full_cut_without_cut_is_noop() {
    let mut b = bridge();
    let report = b.send(note_fully_cut("ghost"));
    assert_eq!(report.failures, 0);
    assert!(b.registry().is_empty());
    assert!(b.out.is_empty());
}

#[test]
fn test_cut_without_score_is_reported() {
    let mut b = bridge();
    let report = b.send(json!({ "event": "noteCut", "noteCut": { "noteID": "x" } }));
    assert_eq!(report.failures, 1);
    assert!(b.registry().is_empty());

    let report = b.send(json!({ "event": "noteCut" }));
    assert_eq!(report.failures, 1);
}

#[test]
fn test_gate_start_twice_keeps_one_entry() {
    let mut b = bridge();
    let gate = NoteId::from("gate:obstacleEnter->obstacleExit");

    b.send(event("obstacleEnter"));
    b.send(event("obstacleEnter"));
    assert!(b.registry().contains(&gate));
    assert_eq!(b.registry().len(), 1);

    b.send(event("obstacleExit"));
    assert!(b.registry().is_empty());

    let ons = b.out.messages().iter().filter(|m| m.is_note_on()).count();
    let offs = b.out.messages().iter().filter(|m| m.is_note_off()).count();
    assert_eq!(ons, 2);
    assert_eq!(offs, 2);
}

#[test]
fn test_bomb_pulse_is_not_registered() {
    let mut b = bridge();
    b.send(event("bombCut"));
    assert!(b.registry().is_empty());

    let messages = b.out.collected();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].message.is_note_on());
    assert!(messages[1].message.is_note_off());
    assert_eq!(messages[1].delay.as_millis(), 100);
}

#[test]
fn test_tempo_note_follows_map() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 240.0));
    let tempo = b.registry().get(&NoteId::from("tempo")).unwrap();
    assert_eq!(tempo.pitch(), Some(86));

    b.send(event("finished"));
    assert!(b.registry().is_empty());
}
