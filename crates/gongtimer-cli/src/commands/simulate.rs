use clap::Args;
use gongtimer_core::error::Result;
use gongtimer_core::{Config, Event, MeditationSession, RecordingCue};
use serde::Serialize;

use super::{describe, SessionArgs};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Print events as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Report {
    total_secs: u64,
    cues: usize,
    events: Vec<Event>,
}

/// Tick `session` from start to zero. Returns every event except ticks, and
/// the number of times the gong was struck.
fn tick_through(session: &mut MeditationSession) -> (Vec<Event>, usize) {
    let not_tick = |e: &Event| !matches!(e, Event::Tick { .. });
    let mut cue = RecordingCue::new();
    let mut events: Vec<Event> = session.start(&mut cue).into_iter().filter(not_tick).collect();
    while !session.is_expired() {
        events.extend(session.tick(&mut cue).into_iter().filter(not_tick));
    }
    (events, cue.plays())
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let config = Config::load()?;
    let mut session = MeditationSession::new(args.session.to_session_config(&config)?);
    let (events, cues) = tick_through(&mut session);

    if args.json {
        let report = Report {
            total_secs: session.total_secs(),
            cues,
            events,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for event in &events {
            if let Some(line) = describe(event) {
                println!("{line}");
            }
        }
        println!("cues: {cues}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gongtimer_core::{NewBell, SessionConfig};

    #[test]
    fn halfway_bell_and_closing_gong() {
        let mut config = SessionConfig::new(60);
        config.bells.add(NewBell::at("00:30")).unwrap();
        let (events, cues) = tick_through(&mut MeditationSession::new(config));
        assert_eq!(cues, 2);
        assert_eq!(events.iter().filter(|e| e.is_cue()).count(), 2);
    }

    #[test]
    fn ticks_are_not_kept() {
        let mut config = SessionConfig::new(3600);
        config.bells.add(NewBell::at("30:00")).unwrap();
        let (events, cues) = tick_through(&mut MeditationSession::new(config));
        assert_eq!(cues, 2);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| !matches!(e, Event::Tick { .. })));
    }

    #[test]
    fn zero_length_session_strikes_once() {
        let (_, cues) = tick_through(&mut MeditationSession::new(SessionConfig::new(0)));
        assert_eq!(cues, 1);
    }
}
