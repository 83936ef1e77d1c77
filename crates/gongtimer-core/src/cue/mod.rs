//! Gong cue emitters.
//!
//! A [`CueEmitter`] makes the sound for a bell or the end of a session.
//! Playback is fire-and-forget: `play` returns as soon as the sound is
//! started, and a second `play` restarts it from the beginning instead of
//! queueing behind the first.

#[cfg(feature = "audio")]
mod gong;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::CueError;

#[cfg(feature = "audio")]
pub use gong::GongPlayer;

pub trait CueEmitter: Send {
    /// Prepare the sound. Calling it again after success does nothing.
    fn load(&mut self) -> Result<(), CueError>;

    /// Start the sound from the beginning.
    fn play(&mut self) -> Result<(), CueError>;

    /// Release the sound. Safe to call more than once; only the first call
    /// releases anything.
    fn unload(&mut self);
}

impl<C: CueEmitter + ?Sized> CueEmitter for Box<C> {
    fn load(&mut self) -> Result<(), CueError> {
        (**self).load()
    }

    fn play(&mut self) -> Result<(), CueError> {
        (**self).play()
    }

    fn unload(&mut self) {
        (**self).unload()
    }
}

/// Rings the ASCII bell on a terminal.
pub struct TerminalBell<W: Write + Send = io::Stdout> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> CueEmitter for TerminalBell<W> {
    fn load(&mut self) -> Result<(), CueError> {
        Ok(())
    }

    fn play(&mut self) -> Result<(), CueError> {
        self.out
            .write_all(b"\x07")
            .and_then(|_| self.out.flush())
            .map_err(|e| CueError::PlaybackFailed(e.to_string()))
    }

    fn unload(&mut self) {}
}

/// Emitter for sessions with the gong switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCue;

impl CueEmitter for SilentCue {
    fn load(&mut self) -> Result<(), CueError> {
        Ok(())
    }

    fn play(&mut self) -> Result<(), CueError> {
        Ok(())
    }

    fn unload(&mut self) {}
}

/// Counters shared by every clone of a [`RecordingCue`].
#[derive(Debug, Default)]
struct CueStats {
    loads: AtomicUsize,
    plays: AtomicUsize,
    unloads: AtomicUsize,
    loaded: AtomicBool,
    failing: AtomicBool,
}

/// Silent emitter that counts what it was asked to do.
///
/// Clones share their counters, so a clone kept by the caller observes an
/// emitter that was moved into a session or runner. Plays are counted even
/// while failure injection is on.
#[derive(Debug, Clone, Default)]
pub struct RecordingCue {
    stats: Arc<CueStats>,
}

impl RecordingCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitter whose `load` and `play` always fail.
    pub fn failing() -> Self {
        let cue = Self::default();
        cue.set_failing(true);
        cue
    }

    pub fn set_failing(&self, failing: bool) {
        self.stats.failing.store(failing, Ordering::SeqCst);
    }

    pub fn plays(&self) -> usize {
        self.stats.plays.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.stats.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.stats.unloads.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.stats.loaded.load(Ordering::SeqCst)
    }

    fn is_failing(&self) -> bool {
        self.stats.failing.load(Ordering::SeqCst)
    }
}

impl CueEmitter for RecordingCue {
    fn load(&mut self) -> Result<(), CueError> {
        if self.is_failing() {
            return Err(CueError::Unavailable("recording cue set to fail".into()));
        }
        if !self.stats.loaded.swap(true, Ordering::SeqCst) {
            self.stats.loads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), CueError> {
        self.stats.plays.fetch_add(1, Ordering::SeqCst);
        if self.is_failing() {
            return Err(CueError::PlaybackFailed("recording cue set to fail".into()));
        }
        Ok(())
    }

    fn unload(&mut self) {
        if self.stats.loaded.swap(false, Ordering::SeqCst) {
            self.stats.unloads.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_bell_writes_bel() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.load().unwrap();
        bell.play().unwrap();
        bell.play().unwrap();
        assert_eq!(bell.into_inner(), b"\x07\x07");
    }

    #[test]
    fn recording_cue_loads_and_unloads_once() {
        let observer = RecordingCue::new();
        let mut cue = observer.clone();
        cue.load().unwrap();
        cue.load().unwrap();
        cue.play().unwrap();
        cue.unload();
        cue.unload();
        assert_eq!(observer.loads(), 1);
        assert_eq!(observer.plays(), 1);
        assert_eq!(observer.unloads(), 1);
        assert!(!observer.is_loaded());
    }

    #[test]
    fn failing_cue_reports_errors() {
        let mut cue = RecordingCue::failing();
        assert!(matches!(cue.load(), Err(CueError::Unavailable(_))));
        assert!(matches!(cue.play(), Err(CueError::PlaybackFailed(_))));
        assert_eq!(cue.plays(), 1);
    }

    #[test]
    fn boxed_emitter_forwards() {
        let observer = RecordingCue::new();
        let mut boxed: Box<dyn CueEmitter> = Box::new(observer.clone());
        boxed.play().unwrap();
        assert_eq!(observer.plays(), 1);
    }
}
