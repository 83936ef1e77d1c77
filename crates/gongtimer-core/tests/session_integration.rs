//! Integration tests for a full meditation session.
//!
//! These tests drive sessions through the public API only: build a bell set,
//! run the countdown to zero and count the gongs.

use gongtimer_core::{
    BellSet, Event, MeditationSession, NewBell, RecordingCue, SessionConfig, SessionStore,
    TimerState,
};

fn run_to_end(session: &mut MeditationSession, cue: &mut RecordingCue) -> Vec<Event> {
    let mut events = session.start(cue);
    while !session.is_expired() {
        events.extend(session.tick(cue));
    }
    events
}

fn rang_at(events: &[Event]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::BellRang { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        })
        .collect()
}

#[test]
fn test_one_minute_with_halfway_bell() {
    let mut config = SessionConfig::from_duration_text("01:00").unwrap();
    config.bells.add(NewBell::at("00:30")).unwrap();
    let mut session = MeditationSession::new(config);
    let mut cue = RecordingCue::new();

    let events = run_to_end(&mut session, &mut cue);

    assert_eq!(rang_at(&events), vec![30]);
    assert!(matches!(
        events.last(),
        Some(Event::SessionCompleted { bells_rung: 1, .. })
    ));
    assert_eq!(cue.plays(), 2);
}

#[test]
fn test_ids_and_order_after_add_and_delete() {
    let mut set = BellSet::new();
    assert_eq!(set.add(NewBell::at("00:45")).unwrap(), 1);
    assert_eq!(set.add(NewBell::at("00:15")).unwrap(), 2);
    let ids: Vec<_> = set.ordered().map(|b| b.id).collect();
    assert_eq!(ids, vec![2, 1]);

    set.add(NewBell::at("00:30")).unwrap();
    set.remove(2).unwrap();
    let times: Vec<_> = set.ordered().map(|b| b.time.clone()).collect();
    assert_eq!(times, vec!["00:30", "00:45"]);
}

#[test]
fn test_pause_and_resume_around_a_bell() {
    let mut config = SessionConfig::new(20);
    config.bells.add(NewBell::at("00:05")).unwrap();
    config.bells.add(NewBell::at("00:10")).unwrap();
    let mut session = MeditationSession::new(config);
    let mut cue = RecordingCue::new();

    let mut events = session.start(&mut cue);
    // Pause exactly when the first bell is due.
    while session.remaining_secs() > 15 {
        events.extend(session.tick(&mut cue));
    }
    session.pause();
    for _ in 0..30 {
        events.extend(session.tick(&mut cue));
        events.extend(session.evaluate(&mut cue));
    }
    assert_eq!(session.state(), TimerState::Paused);
    assert_eq!(session.remaining_secs(), 15);
    session.resume();
    events.extend(session.evaluate(&mut cue));
    while !session.is_expired() {
        events.extend(session.tick(&mut cue));
    }

    assert_eq!(rang_at(&events), vec![15, 10]);
    assert_eq!(cue.plays(), 3);
}

#[test]
fn test_settings_edit_rebuilds_the_timer() {
    let settings = SessionStore::new(SessionConfig::new(60));
    let timer_side = settings.clone();
    let mut session = MeditationSession::from_store(&timer_side);
    let mut cue = RecordingCue::new();
    session.start(&mut cue);
    session.tick(&mut cue);

    let id = settings.add_bell(NewBell::at("00:20").with_label("Second")).unwrap();
    assert!(session.sync(&timer_side).is_some());
    assert_eq!(session.state(), TimerState::Idle);
    assert_eq!(session.config().bells.get(id).map(|b| b.label.as_str()), Some("Second"));

    let events = run_to_end(&mut session, &mut cue);
    assert_eq!(rang_at(&events), vec![40]);
}

#[test]
fn test_events_serialize_with_type_tag() {
    let mut session = MeditationSession::new(SessionConfig::new(1));
    let mut cue = RecordingCue::new();
    let events = run_to_end(&mut session, &mut cue);

    let json = serde_json::to_value(&events).unwrap();
    let types: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, vec!["SessionStarted", "Tick", "SessionCompleted"]);
}
