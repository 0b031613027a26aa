//! State merging, transitions, and shutdown across the full chain.

use crate::helpers::{bridge, bridge_with, event, note_cut, song_start};
use saber_midi::config::BridgeConfig;
use saber_midi::prelude::*;
use saber_midi::{Error, ProcessorError};
use serde_json::json;
use std::fmt;

#[test]
fn test_snapshots_are_sticky() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 150.0));
    b.send(note_cut("1", "NoteA", 50.0, 5.0));
    b.send(json!({ "event": "pause", "status": { "game": { "scene": "Pause" } } }));

    let state = b.monitor.state();
    assert_eq!(state.beatmap.as_ref().unwrap().level_id.as_deref(), Some("level"));
    assert_eq!(state.game, Some(json!({ "scene": "Pause" })));
    assert!(state.paused);
    assert!(state.in_map);

    b.send(event("resume"));
    b.send(event("failed"));
    let state = b.monitor.state();
    assert!(!state.paused);
    assert!(!state.in_map);
    // Snapshots outlive the map
    assert!(state.beatmap.is_some());
}

#[test]
fn test_malformed_messages_are_rejected() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    let state = b.monitor.state().clone();
    let sent = b.out.len();

    for bad in ["", "[]", "{\"status\":{}}", "{\"event\":5}", "not json"] {
        assert!(matches!(
            b.monitor.dispatch(bad),
            Err(Error::MalformedMessage(_))
        ));
    }
    assert_eq!(b.monitor.state(), &state);
    assert_eq!(b.out.len(), sent);
}

#[test]
fn test_menu_with_mistyped_snapshot_still_aborts() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    b.send(event("obstacleEnter"));
    assert_eq!(b.registry().len(), 2);

    let report = b.send(json!({
        "event": "menu",
        "status": { "performance": { "score": 1234.0, "softFailed": "no" } }
    }));
    assert_eq!(report.failures, 0);
    assert!(b.registry().is_empty());
    assert!(!b.monitor.state().in_map);
    // The previous performance snapshot is kept
    assert_eq!(
        b.monitor.state().performance.as_ref().unwrap().soft_failed,
        Some(false)
    );
}

#[test]
fn test_unknown_events_pass_through() {
    let mut b = bridge();
    let report = b.send(event("somethingNew"));
    assert!(!report.suppressed);
    assert_eq!(report.failures, 0);
    assert!(b.out.is_empty());
}

#[test]
fn test_shutdown_silences_everything() {
    let mut b = bridge();
    b.send(song_start("level", "Song", 120.0));
    b.send(note_cut("1", "NoteA", 50.0, 5.0));
    b.send(event("obstacleEnter"));
    assert_eq!(b.registry().len(), 3);

    b.monitor.shutdown();
    assert!(b.registry().is_empty());
    assert!(!b.monitor.state().in_map);

    let ons = b.out.messages().iter().filter(|m| m.is_note_on()).count();
    let offs = b.out.messages().iter().filter(|m| m.is_note_off()).count();
    assert_eq!(ons, offs);
}

/// Claims every block cut for itself.
struct Swallow;

impl Processor for Swallow {
    fn process(&mut self, _state: &SessionState, message: &Message) -> ProcessResult {
        match message.event {
            Event::NoteCut => Ok(Outcome::Halt),
            Event::BombCut => Err(ProcessorError::Other("bombs unsupported".into())),
            _ => Ok(Outcome::Pass),
        }
    }
}

impl fmt::Display for Swallow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Swallow")
    }
}

#[test]
fn test_custom_processor_halts_before_cleanup() {
    let config = BridgeConfig {
        block_channels: None,
        ..BridgeConfig::default()
    };
    let out = Arc::new(MidiOutputCollector::new());
    let mut monitor = Monitor::builder(out.clone())
        .config(config)
        .without_archive()
        .custom(|_| Box::new(Swallow))
        .build();
    let names = monitor.processor_names();
    assert_eq!(names[names.len() - 2], "Swallow");

    let report = monitor
        .dispatch(&note_cut("1", "NoteA", 50.0, 5.0).to_string())
        .unwrap();
    assert_eq!(report.halted_by, Some(names.len() - 2));

    // The failure is absorbed and the pulse earlier in the chain still fired
    let report = monitor.dispatch(&event("bombCut").to_string()).unwrap();
    assert_eq!(report.failures, 1);
    assert!(report.suppressed);
    assert_eq!(out.len(), 2);
}

#[test]
fn test_hello_is_handled() {
    let mut b = bridge_with(BridgeConfig::default());
    let report = b.send(event("hello"));
    assert!(report.suppressed);
    assert!(b.out.is_empty());
}
