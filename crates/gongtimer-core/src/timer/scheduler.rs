//! Bell scheduler.
//!
//! Maps each bell's offset from session start onto the countdown value at
//! which it must ring (`total - offset`) and remembers which bells already
//! rang this session. Evaluating twice at the same remaining value never
//! rings a bell twice, and the closing gong is struck once, on the first
//! evaluation that sees the engine expired.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::engine::{CountdownEngine, TimerState};
use crate::bell::{Bell, BellId, BellSet};
use crate::cue::CueEmitter;
use crate::events::Event;

#[derive(Debug, Clone, Default)]
pub struct BellScheduler {
    fired: HashSet<BellId>,
    terminal_fired: bool,
}

impl BellScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything that rang. Called when a new session starts.
    pub fn clear(&mut self) {
        self.fired.clear();
        self.terminal_fired = false;
    }

    pub fn has_fired(&self, id: BellId) -> bool {
        self.fired.contains(&id)
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    pub fn terminal_fired(&self) -> bool {
        self.terminal_fired
    }

    /// Countdown value at which `bell` rings, or `None` if its offset lies
    /// beyond the end of the session.
    pub fn trigger_remaining(total_secs: u64, bell: &Bell) -> Option<u64> {
        total_secs.checked_sub(bell.offset_secs)
    }

    /// Bells that can still ring in a session of `total_secs`.
    pub fn bells_remaining(&self, total_secs: u64, bells: &BellSet) -> usize {
        bells
            .ordered()
            .filter(|b| Self::trigger_remaining(total_secs, b).is_some())
            .filter(|b| !self.fired.contains(&b.id))
            .count()
    }

    /// Ring whatever is due at the engine's current remaining value.
    ///
    /// Everything due in one evaluation shares a single `play`. A failing cue
    /// is logged and the bells still count as rung.
    pub fn evaluate<C>(
        &mut self,
        engine: &CountdownEngine,
        bells: &BellSet,
        cue: &mut C,
    ) -> Vec<Event>
    where
        C: CueEmitter + ?Sized,
    {
        if engine.state() == TimerState::Idle {
            return Vec::new();
        }

        let total = engine.total_secs();
        let remaining = engine.remaining_secs();
        let now = Utc::now();
        let mut events = Vec::new();

        for bell in bells.ordered() {
            if self.fired.contains(&bell.id) {
                continue;
            }
            if Self::trigger_remaining(total, bell) == Some(remaining) {
                self.fired.insert(bell.id);
                debug!(bell_id = bell.id, remaining, "bell due");
                events.push(Event::BellRang {
                    bell_id: bell.id,
                    label: bell.label.clone(),
                    offset_secs: bell.offset_secs,
                    remaining_secs: remaining,
                    at: now,
                });
            }
        }

        if engine.is_expired() && !self.terminal_fired {
            self.terminal_fired = true;
            info!(total, bells_rung = self.fired.len(), "session complete");
            events.push(Event::SessionCompleted {
                total_secs: total,
                bells_rung: self.fired.len(),
                at: now,
            });
        }

        if !events.is_empty() {
            if let Err(e) = cue.play() {
                warn!("gong failed, continuing silently: {e}");
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bell::NewBell;
    use crate::cue::RecordingCue;
    use proptest::prelude::*;

    fn bells(times: &[&str]) -> BellSet {
        let mut set = BellSet::new();
        for t in times {
            set.add(NewBell::at(*t)).unwrap();
        }
        set
    }

    fn run_to_end(
        total: u64,
        set: &BellSet,
        cue: &mut RecordingCue,
        scheduler: &mut BellScheduler,
    ) -> Vec<Event> {
        let mut engine = CountdownEngine::new(total);
        engine.start(total);
        let mut events = scheduler.evaluate(&engine, set, cue);
        while engine.tick().is_some() {
            events.extend(scheduler.evaluate(&engine, set, cue));
        }
        events
    }

    #[test]
    fn one_minute_with_halfway_bell_rings_twice() {
        let set = bells(&["00:30"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let events = run_to_end(60, &set, &mut cue, &mut scheduler);

        assert_eq!(cue.plays(), 2);
        match &events[0] {
            Event::BellRang {
                bell_id,
                remaining_secs,
                ..
            } => {
                assert_eq!(*bell_id, 1);
                assert_eq!(*remaining_secs, 30);
            }
            other => panic!("expected BellRang, got {other:?}"),
        }
        assert!(matches!(
            events[1],
            Event::SessionCompleted {
                total_secs: 60,
                bells_rung: 1,
                ..
            }
        ));
    }

    #[test]
    fn re_evaluation_does_not_ring_again() {
        let set = bells(&["00:02"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let mut engine = CountdownEngine::new(5);
        engine.start(5);
        engine.tick();
        engine.tick();
        assert_eq!(scheduler.evaluate(&engine, &set, &mut cue).len(), 1);
        assert!(scheduler.evaluate(&engine, &set, &mut cue).is_empty());
        assert!(scheduler.evaluate(&engine, &set, &mut cue).is_empty());
        assert_eq!(cue.plays(), 1);
        assert!(scheduler.has_fired(1));
    }

    #[test]
    fn terminal_cue_only_at_zero_and_only_once() {
        let set = BellSet::new();
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let mut engine = CountdownEngine::new(3);
        engine.start(3);

        for _ in 0..2 {
            engine.tick();
            assert!(scheduler.evaluate(&engine, &set, &mut cue).is_empty());
        }
        assert_eq!(cue.plays(), 0);

        engine.tick();
        assert_eq!(scheduler.evaluate(&engine, &set, &mut cue).len(), 1);
        assert!(scheduler.evaluate(&engine, &set, &mut cue).is_empty());
        assert_eq!(cue.plays(), 1);
        assert!(scheduler.terminal_fired());
    }

    #[test]
    fn bell_at_offset_zero_rings_at_start() {
        let set = bells(&["00:00"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let mut engine = CountdownEngine::new(10);
        engine.start(10);
        let events = scheduler.evaluate(&engine, &set, &mut cue);
        assert!(matches!(
            events.as_slice(),
            [Event::BellRang {
                remaining_secs: 10,
                ..
            }]
        ));
    }

    #[test]
    fn bell_at_end_shares_the_closing_gong() {
        let set = bells(&["00:10"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let events = run_to_end(10, &set, &mut cue, &mut scheduler);
        assert_eq!(events.len(), 2);
        assert_eq!(cue.plays(), 1);
    }

    #[test]
    fn colliding_bells_share_one_gong() {
        let set = bells(&["00:05", "0:00:05"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let events = run_to_end(20, &set, &mut cue, &mut scheduler);
        let rung = events.iter().filter(|e| matches!(e, Event::BellRang { .. })).count();
        assert_eq!(rung, 2);
        assert_eq!(cue.plays(), 2);
    }

    #[test]
    fn bells_past_the_end_never_ring() {
        let set = bells(&["02:00", "00:30"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        assert_eq!(scheduler.bells_remaining(60, &set), 1);
        let events = run_to_end(60, &set, &mut cue, &mut scheduler);
        assert_eq!(events.iter().filter(|e| e.is_cue()).count(), 2);
        assert!(!scheduler.has_fired(1));
        assert_eq!(scheduler.bells_remaining(60, &set), 0);
    }

    #[test]
    fn idle_engine_rings_nothing() {
        let set = bells(&["00:00"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        let engine = CountdownEngine::new(10);
        assert!(scheduler.evaluate(&engine, &set, &mut cue).is_empty());
        assert_eq!(cue.plays(), 0);
    }

    #[test]
    fn failing_cue_does_not_stop_the_session() {
        let set = bells(&["00:01", "00:02"]);
        let mut cue = RecordingCue::failing();
        let mut scheduler = BellScheduler::new();
        let events = run_to_end(3, &set, &mut cue, &mut scheduler);
        assert_eq!(events.len(), 3);
        assert_eq!(scheduler.fired_count(), 2);
        assert!(scheduler.terminal_fired());
    }

    #[test]
    fn clear_allows_a_new_session_to_ring_again() {
        let set = bells(&["00:01"]);
        let mut cue = RecordingCue::new();
        let mut scheduler = BellScheduler::new();
        run_to_end(2, &set, &mut cue, &mut scheduler);
        scheduler.clear();
        run_to_end(2, &set, &mut cue, &mut scheduler);
        assert_eq!(cue.plays(), 4);
    }

    proptest! {
        #[test]
        fn every_reachable_bell_rings_exactly_once(
            total in 1u64..300,
            offsets in proptest::collection::vec(0u64..300, 0..8),
        ) {
            let mut set = BellSet::new();
            for o in &offsets {
                set.add(NewBell::at(crate::duration::format_seconds(*o))).unwrap();
            }
            let mut cue = RecordingCue::new();
            let mut scheduler = BellScheduler::new();
            let mut engine = CountdownEngine::new(total);
            engine.start(total);

            let mut rung: Vec<BellId> = Vec::new();
            let mut completed = 0;
            let collect = |events: Vec<Event>, rung: &mut Vec<BellId>, completed: &mut usize| {
                for e in events {
                    match e {
                        Event::BellRang { bell_id, .. } => rung.push(bell_id),
                        Event::SessionCompleted { .. } => *completed += 1,
                        _ => {}
                    }
                }
            };

            collect(scheduler.evaluate(&engine, &set, &mut cue), &mut rung, &mut completed);
            while engine.tick().is_some() {
                collect(scheduler.evaluate(&engine, &set, &mut cue), &mut rung, &mut completed);
                // Re-evaluation without a tick must add nothing.
                collect(scheduler.evaluate(&engine, &set, &mut cue), &mut rung, &mut completed);
            }

            let mut expected: Vec<BellId> = set
                .ordered()
                .filter(|b| b.offset_secs <= total)
                .map(|b| b.id)
                .collect();
            expected.sort_unstable();
            rung.sort_unstable();
            prop_assert_eq!(rung, expected);
            prop_assert_eq!(completed, 1);
        }
    }
}
