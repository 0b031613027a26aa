//! Performance controls and resting resets.

use crate::helpers::{bridge, event, note_cut, score_changed, song_start};
use std::collections::BTreeMap;

fn resting() -> BTreeMap<u8, u8> {
    BTreeMap::from([(0, 127), (1, 127), (2, 0), (3, 127), (4, 64), (5, 0), (6, 0)])
}

#[test]
fn test_menu_silences_and_rests() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    b.send(note_cut("a", "NoteA", 60.0, 10.0));
    b.send(note_cut("b", "NoteB", 20.0, 3.0));
    b.send(score_changed(100, 200, 2, 2));
    assert!(b.registry().len() >= 2);
    b.out.drain_all();

    b.send(event("menu"));
    assert!(b.registry().is_empty());

    let sent = b.out.messages();
    let controls: Vec<_> = sent.iter().filter_map(|m| m.control()).collect();
    assert_eq!(controls.len(), 7, "each control reset exactly once");
    assert_eq!(b.controls(), resting());
    assert!(sent.iter().filter(|m| m.is_note_off()).count() >= 2);
}

#[test]
fn test_reset_is_unconditional() {
    let mut b = bridge();
    b.send(event("menu"));
    b.send(event("menu"));
    let controls = b.out.messages().iter().filter(|m| m.is_control_change()).count();
    assert_eq!(controls, 14);
}

#[test]
fn test_control_values_from_snapshot() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    b.send(score_changed(50, 100, 5, 5));

    let values = b.controls();
    assert_eq!(values[&0], 64);
    assert_eq!(values[&1], 95);
    assert_eq!(values[&2], 0);
    assert_eq!(values[&3], 127);
    assert_eq!(values[&4], 64);
    assert_eq!(values[&5], 32);
    assert_eq!(values[&6], 6);
}

#[test]
fn test_unchanged_values_are_not_resent() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    b.send(score_changed(50, 100, 5, 5));
    b.out.drain_all();

    b.send(score_changed(50, 100, 5, 5));
    assert!(b.out.is_empty());

    b.send(score_changed(60, 100, 6, 6));
    let changed: Vec<_> = b.out.messages().iter().filter_map(|m| m.control()).collect();
    // score and progress only
    assert_eq!(changed, vec![(0, 76), (6, 8)]);
}

#[test]
fn test_soft_fail_raises_control() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    b.send(score_changed(50, 100, 5, 5));
    b.send(event("softFailed"));
    b.send(score_changed(50, 100, 5, 5));
    assert_eq!(b.controls()[&2], 127);

    b.send(event("finished"));
    b.send(song_start("level", "Song", 120.0));
    assert_eq!(b.controls()[&2], 0);
}
