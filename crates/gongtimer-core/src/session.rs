//! Session configuration and the countdown/bell pairing that runs it.
//!
//! The settings side and the timer side share one [`SessionStore`] handle.
//! Every write bumps a revision; a [`MeditationSession`] that notices a new
//! revision throws its countdown away and rebuilds from the new
//! configuration rather than patching the running one.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bell::{BellId, BellSet, NewBell};
use crate::cue::CueEmitter;
use crate::duration::{format_seconds, parse_to_seconds, DEFAULT_DURATION_SECS};
use crate::error::ValidationError;
use crate::events::Event;
use crate::timer::{BellScheduler, CountdownEngine, TimerState};

/// Duration plus bells: everything needed to run a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub duration_secs: u64,
    pub bells: BellSet,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS)
    }
}

impl SessionConfig {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            bells: BellSet::new(),
        }
    }

    pub fn from_duration_text(text: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(parse_to_seconds(text).into_result()?))
    }

    pub fn duration_text(&self) -> String {
        format_seconds(self.duration_secs)
    }
}

#[derive(Debug, Default)]
struct Versioned {
    config: SessionConfig,
    revision: u64,
}

/// Shared, mutable session configuration.
///
/// Clones are handles to the same configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Versioned>>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Versioned {
                config,
                revision: 0,
            })),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionConfig) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard.config)
    }

    /// Mutate the configuration. Always counts as a change.
    pub fn write<R>(&self, f: impl FnOnce(&mut SessionConfig) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.revision += 1;
        f(&mut guard.config)
    }

    /// Mutate the configuration; only a successful closure counts as a change.
    pub fn try_write<R, E>(
        &self,
        f: impl FnOnce(&mut SessionConfig) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let out = f(&mut guard.config)?;
        guard.revision += 1;
        Ok(out)
    }

    pub fn revision(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }

    /// Copy of the configuration together with its revision.
    pub fn snapshot(&self) -> (SessionConfig, u64) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (guard.config.clone(), guard.revision)
    }

    pub fn set_duration(&self, duration_secs: u64) {
        self.write(|cfg| cfg.duration_secs = duration_secs);
    }

    pub fn add_bell(&self, bell: NewBell) -> Result<BellId, ValidationError> {
        self.try_write(|cfg| cfg.bells.add(bell))
    }

    pub fn remove_bell(&self, id: BellId) -> Result<(), ValidationError> {
        self.try_write(|cfg| {
            cfg.bells
                .remove(id)
                .map(|_| ())
                .ok_or(ValidationError::UnknownBell { id })
        })
    }
}

/// One run of the countdown over a fixed configuration.
#[derive(Debug, Clone)]
pub struct MeditationSession {
    config: SessionConfig,
    revision: Option<u64>,
    engine: CountdownEngine,
    scheduler: BellScheduler,
}

impl MeditationSession {
    /// Idle session over `config`.
    pub fn new(config: SessionConfig) -> Self {
        let engine = CountdownEngine::new(config.duration_secs);
        Self {
            config,
            revision: None,
            engine,
            scheduler: BellScheduler::new(),
        }
    }

    /// Idle session over the store's current configuration.
    pub fn from_store(store: &SessionStore) -> Self {
        let (config, revision) = store.snapshot();
        let mut session = Self::new(config);
        session.revision = Some(revision);
        session
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> TimerState {
        self.engine.state()
    }

    pub fn total_secs(&self) -> u64 {
        self.engine.total_secs()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.engine.remaining_secs()
    }

    pub fn remaining_text(&self) -> String {
        format_seconds(self.engine.remaining_secs())
    }

    pub fn bells_remaining(&self) -> usize {
        self.scheduler
            .bells_remaining(self.engine.total_secs(), &self.config.bells)
    }

    pub fn has_fired(&self, id: BellId) -> bool {
        self.scheduler.has_fired(id)
    }

    pub fn is_expired(&self) -> bool {
        self.engine.is_expired()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.engine.state(),
            total_secs: self.engine.total_secs(),
            remaining_secs: self.engine.remaining_secs(),
            remaining_text: self.remaining_text(),
            bells_remaining: self.bells_remaining(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh countdown and ring anything due at the first instant.
    pub fn start<C: CueEmitter + ?Sized>(&mut self, cue: &mut C) -> Vec<Event> {
        let total = self.config.duration_secs;
        self.scheduler.clear();
        self.engine.start(total);

        for bell in self.config.bells.ordered() {
            if BellScheduler::trigger_remaining(total, bell).is_none() {
                debug!(
                    bell_id = bell.id,
                    time = %bell.time,
                    "bell falls after the end of the session and will not ring"
                );
            }
        }
        info!(total, bells = self.config.bells.len(), "session started");

        let mut events = vec![Event::SessionStarted {
            total_secs: total,
            bell_count: self.config.bells.len(),
            at: Utc::now(),
        }];
        events.extend(self.evaluate(cue));
        events
    }

    /// Pause a running session or resume a paused one. An idle session
    /// starts. An expired session ignores the toggle.
    pub fn toggle<C: CueEmitter + ?Sized>(&mut self, cue: &mut C) -> Vec<Event> {
        match self.engine.state() {
            TimerState::Idle => self.start(cue),
            TimerState::Running => self.pause().into_iter().collect(),
            TimerState::Paused => self.resume().into_iter().collect(),
            TimerState::Expired => Vec::new(),
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause().then(|| Event::TimerPaused {
            remaining_secs: self.engine.remaining_secs(),
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.engine.resume().then(|| Event::TimerResumed {
            remaining_secs: self.engine.remaining_secs(),
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Event {
        self.engine.reset();
        self.scheduler.clear();
        Event::TimerReset { at: Utc::now() }
    }

    /// One second passed.
    pub fn tick<C: CueEmitter + ?Sized>(&mut self, cue: &mut C) -> Vec<Event> {
        let Some(outcome) = self.engine.tick() else {
            return Vec::new();
        };
        let mut events = vec![Event::Tick {
            remaining_secs: outcome.remaining_secs,
            at: Utc::now(),
        }];
        events.extend(self.evaluate(cue));
        events
    }

    /// Re-check bells at the current remaining value without ticking.
    pub fn evaluate<C: CueEmitter + ?Sized>(&mut self, cue: &mut C) -> Vec<Event> {
        self.scheduler
            .evaluate(&self.engine, &self.config.bells, cue)
    }

    /// Rebuild from `store` if its configuration changed since this session
    /// was built. The rebuilt session is idle.
    pub fn sync(&mut self, store: &SessionStore) -> Option<Event> {
        if self.revision == Some(store.revision()) {
            return None;
        }
        let (config, revision) = store.snapshot();
        info!(
            revision,
            total = config.duration_secs,
            bells = config.bells.len(),
            "session configuration changed; reinitializing"
        );
        self.engine.load(config.duration_secs);
        self.scheduler.clear();
        self.config = config;
        self.revision = Some(revision);
        Some(Event::SessionReinitialized {
            total_secs: self.config.duration_secs,
            bell_count: self.config.bells.len(),
            at: Utc::now(),
        })
    }
}
