//! Real-time driver for a [`MeditationSession`].
//!
//! The runner owns the session and the cue emitter behind one async mutex so
//! every transition is serialized. While the session runs, a spawned ticker
//! task removes one second per elapsed period. Pausing aborts the ticker;
//! resuming spawns a new one whose first tick is a full period away, so time
//! spent paused is never caught up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::cue::CueEmitter;
use crate::events::Event;
use crate::session::{MeditationSession, SessionStore};
use crate::timer::TimerState;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

struct Shared<C: CueEmitter> {
    session: MeditationSession,
    cue: C,
    unloaded: bool,
}

impl<C: CueEmitter> Shared<C> {
    fn unload_once(&mut self) {
        if !self.unloaded {
            self.unloaded = true;
            self.cue.unload();
        }
    }
}

// Runs once the runner and any aborted ticker have both let go.
impl<C: CueEmitter> Drop for Shared<C> {
    fn drop(&mut self) {
        self.unload_once();
    }
}

pub struct SessionRunner<C: CueEmitter + 'static> {
    shared: Arc<Mutex<Shared<C>>>,
    ticker: Option<JoinHandle<()>>,
    tick_interval: Duration,
    store: Option<SessionStore>,
    tx: mpsc::UnboundedSender<Event>,
}

impl<C: CueEmitter + 'static> SessionRunner<C> {
    /// Build a runner and load the cue. A cue that fails to load is logged
    /// and the session runs silently.
    pub fn new(
        session: MeditationSession,
        mut cue: C,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        if let Err(e) = cue.load() {
            warn!("gong unavailable, session will be silent: {e}");
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Self {
            shared: Arc::new(Mutex::new(Shared {
                session,
                cue,
                unloaded: false,
            })),
            ticker: None,
            tick_interval,
            store: None,
            tx,
        };
        (runner, rx)
    }

    /// Watch `store` for configuration changes on every tick.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn state(&self) -> TimerState {
        self.shared.lock().await.session.state()
    }

    pub async fn remaining_secs(&self) -> u64 {
        self.shared.lock().await.session.remaining_secs()
    }

    pub async fn snapshot(&self) -> Event {
        self.shared.lock().await.session.snapshot()
    }

    pub async fn start(&mut self) {
        let state = {
            let mut guard = self.shared.lock().await;
            let Shared { session, cue, .. } = &mut *guard;
            self.sync(session);
            let events = session.start(cue);
            self.publish(events);
            session.state()
        };
        self.follow(state).await;
    }

    /// Pause, resume or start. A paused or finished session whose settings
    /// changed is rebuilt idle instead of resuming.
    pub async fn toggle(&mut self) -> TimerState {
        let state = {
            let mut guard = self.shared.lock().await;
            let Shared { session, cue, .. } = &mut *guard;
            let prior = session.state();
            let rebuilt = prior != TimerState::Running && self.sync(session);
            if rebuilt && prior != TimerState::Idle {
                TimerState::Idle
            } else {
                let events = session.toggle(cue);
                self.publish(events);
                session.state()
            }
        };
        self.follow(state).await;
        state
    }

    pub async fn pause(&mut self) {
        let shared = Arc::clone(&self.shared);
        let mut guard = shared.lock().await;
        if let Some(event) = guard.session.pause() {
            self.publish([event]);
        }
        // Abort while holding the lock so no tick can slip in after the pause.
        self.cancel_ticker();
    }

    pub async fn resume(&mut self) {
        let resumed = {
            let mut guard = self.shared.lock().await;
            if self.sync(&mut guard.session) {
                return;
            }
            let event = guard.session.resume();
            let resumed = event.is_some();
            self.publish(event);
            resumed
        };
        if resumed {
            self.spawn_ticker();
        }
    }

    /// Stop ticking and release the cue. The cue is released exactly once.
    pub async fn shutdown(mut self) {
        self.cancel_ticker();
        self.shared.lock().await.unload_once();
    }

    async fn follow(&mut self, state: TimerState) {
        match state {
            TimerState::Running => self.spawn_ticker(),
            _ => {
                let shared = Arc::clone(&self.shared);
                let _guard = shared.lock().await;
                self.cancel_ticker();
            }
        }
    }

    /// Rebuild `session` if the watched store changed. Returns true if it did.
    fn sync(&self, session: &mut MeditationSession) -> bool {
        let Some(event) = self.store.as_ref().and_then(|store| session.sync(store)) else {
            return false;
        };
        self.publish([event]);
        true
    }

    fn publish(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            // A dropped receiver just means nobody is listening.
            let _ = self.tx.send(event);
        }
    }

    fn spawn_ticker(&mut self) {
        self.cancel_ticker();

        let shared = Arc::clone(&self.shared);
        let tx = self.tx.clone();
        let store = self.store.clone();
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;

                let mut guard = shared.lock().await;
                let Shared { session, cue, .. } = &mut *guard;

                if let Some(store) = &store {
                    if let Some(event) = session.sync(store) {
                        let _ = tx.send(event);
                        debug!("ticker stopped: session reinitialized");
                        break;
                    }
                }
                if session.state() != TimerState::Running {
                    break;
                }
                for event in session.tick(cue) {
                    let _ = tx.send(event);
                }
                if session.is_expired() {
                    debug!("ticker stopped: session expired");
                    break;
                }
            }
        });

        self.ticker = Some(handle);
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl<C: CueEmitter + 'static> Drop for SessionRunner<C> {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bell::NewBell;
    use crate::cue::RecordingCue;
    use crate::session::SessionConfig;

    fn session(duration_secs: u64, bells: &[&str]) -> MeditationSession {
        let mut cfg = SessionConfig::new(duration_secs);
        for t in bells {
            cfg.bells.add(NewBell::at(*t)).unwrap();
        }
        MeditationSession::new(cfg)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_in_real_time() {
        let cue = RecordingCue::new();
        let (mut runner, mut rx) =
            SessionRunner::new(session(5, &["00:02"]), cue.clone(), DEFAULT_TICK_INTERVAL);
        assert_eq!(cue.loads(), 1);

        runner.start().await;
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(runner.remaining_secs().await, 3);
        assert_eq!(cue.plays(), 1);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runner.state().await, TimerState::Expired);
        assert_eq!(cue.plays(), 2);

        let events = drain(&mut rx);
        let ticks = events
            .iter()
            .filter(|e| matches!(e, Event::Tick { .. }))
            .count();
        assert_eq!(ticks, 5);
        assert!(matches!(events.last(), Some(Event::SessionCompleted { .. })));

        runner.shutdown().await;
        assert_eq!(cue.unloads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticking_and_resume_does_not_catch_up() {
        let cue = RecordingCue::new();
        let (mut runner, mut rx) =
            SessionRunner::new(session(10, &["00:05"]), cue.clone(), DEFAULT_TICK_INTERVAL);
        runner.start().await;

        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(runner.toggle().await, TimerState::Paused);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runner.remaining_secs().await, 8);

        runner.resume().await;
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runner.remaining_secs().await, 8);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runner.remaining_secs().await, 7);

        time::sleep(Duration::from_secs(20)).await;
        let events = drain(&mut rx);
        let bells = events
            .iter()
            .filter(|e| matches!(e, Event::BellRang { .. }))
            .count();
        assert_eq!(bells, 1);
        assert_eq!(cue.plays(), 2);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TimerPaused { remaining_secs: 8, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn config_change_stops_the_ticker() {
        let store = SessionStore::new(SessionConfig::new(30));
        let cue = RecordingCue::new();
        let (runner, mut rx) = SessionRunner::new(
            MeditationSession::from_store(&store),
            cue.clone(),
            DEFAULT_TICK_INTERVAL,
        );
        let mut runner = runner.with_store(store.clone());
        runner.start().await;
        time::sleep(Duration::from_millis(1_500)).await;

        store.set_duration(45);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.state().await, TimerState::Idle);
        assert_eq!(runner.remaining_secs().await, 45);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, Event::SessionReinitialized { total_secs: 45, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_when_cue_fails_to_load() {
        let cue = RecordingCue::failing();
        let (mut runner, _rx) =
            SessionRunner::new(session(2, &[]), cue.clone(), DEFAULT_TICK_INTERVAL);
        runner.start().await;
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(runner.state().await, TimerState::Expired);
        assert_eq!(cue.loads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_edit_while_paused_rebuilds_on_toggle() {
        let store = SessionStore::new(SessionConfig::new(30));
        let cue = RecordingCue::new();
        let (runner, mut rx) = SessionRunner::new(
            MeditationSession::from_store(&store),
            cue.clone(),
            DEFAULT_TICK_INTERVAL,
        );
        let mut runner = runner.with_store(store.clone());
        runner.start().await;
        time::sleep(Duration::from_millis(1_500)).await;
        runner.pause().await;
        drain(&mut rx);

        store.add_bell(NewBell::at("00:10")).unwrap();
        assert_eq!(runner.toggle().await, TimerState::Idle);
        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [Event::SessionReinitialized { total_secs: 30, bell_count: 1, .. }]
        ));

        // Nothing ticks until the rebuilt session is started.
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runner.remaining_secs().await, 30);
        assert_eq!(runner.toggle().await, TimerState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_after_settings_edit_stays_idle() {
        let store = SessionStore::new(SessionConfig::new(30));
        let (runner, mut rx) = SessionRunner::new(
            MeditationSession::from_store(&store),
            RecordingCue::new(),
            DEFAULT_TICK_INTERVAL,
        );
        let mut runner = runner.with_store(store.clone());
        runner.start().await;
        runner.pause().await;
        store.set_duration(60);
        drain(&mut rx);

        runner.resume().await;
        assert_eq!(runner.state().await, TimerState::Idle);
        assert_eq!(runner.remaining_secs().await, 60);
        assert!(!drain(&mut rx)
            .iter()
            .any(|e| matches!(e, Event::TimerResumed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_while_ticking_releases_the_cue_once() {
        let cue = RecordingCue::new();
        let (mut runner, _rx) =
            SessionRunner::new(session(30, &[]), cue.clone(), DEFAULT_TICK_INTERVAL);
        runner.start().await;
        time::sleep(Duration::from_millis(1_500)).await;
        drop(runner);

        // The aborted ticker still holds the session until it is polled again.
        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cue.unloads(), 1);
    }

    #[tokio::test]
    async fn drop_releases_the_cue_once() {
        let cue = RecordingCue::new();
        let (runner, _rx) = SessionRunner::new(session(2, &[]), cue.clone(), DEFAULT_TICK_INTERVAL);
        drop(runner);
        assert_eq!(cue.unloads(), 1);
    }
}
