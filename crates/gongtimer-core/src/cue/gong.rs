use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use rodio::source::Buffered;
use rodio::{Decoder, OutputStream, Sink, Source};
use tracing::{debug, warn};

use super::CueEmitter;
use crate::error::CueError;

type GongSource = Buffered<Decoder<BufReader<File>>>;

enum GongCommand {
    Play,
    Shutdown,
}

/// Plays a decoded sound file through the default output device.
///
/// The output stream is not `Send`, so it lives on a dedicated audio thread
/// that owns the stream, the current sink and the decoded sound. Each `play`
/// stops the previous sink and starts a fresh one.
pub struct GongPlayer {
    path: PathBuf,
    volume: f32,
    tx: Option<Sender<GongCommand>>,
    thread: Option<JoinHandle<()>>,
}

impl GongPlayer {
    /// `volume` is a percentage, clamped to 0..=100.
    pub fn new(path: impl Into<PathBuf>, volume: u32) -> Self {
        Self {
            path: path.into(),
            volume: volume.min(100) as f32 / 100.0,
            tx: None,
            thread: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spawn_audio_thread(&self) -> Result<(Sender<GongCommand>, JoinHandle<()>), CueError> {
        let (tx, rx) = mpsc::channel::<GongCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CueError>>();
        let path = self.path.clone();
        let volume = self.volume;

        let handle = thread::Builder::new()
            .name("gong-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(CueError::Unavailable(e.to_string())));
                        return;
                    }
                };
                let sound: GongSource = match open_sound(&path) {
                    Ok(sound) => sound,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let mut sink: Option<Sink> = None;
                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        GongCommand::Play => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            match Sink::try_new(&handle) {
                                Ok(new_sink) => {
                                    new_sink.set_volume(volume);
                                    new_sink.append(sound.clone());
                                    sink = Some(new_sink);
                                }
                                Err(e) => warn!("gong sink unavailable: {e}"),
                            }
                        }
                        GongCommand::Shutdown => break,
                    }
                }
                if let Some(old) = sink.take() {
                    old.stop();
                }
            })
            .map_err(|e| CueError::Unavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok((tx, handle)),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CueError::Unavailable("audio thread exited during load".into()))
            }
        }
    }
}

fn open_sound(path: &Path) -> Result<GongSource, CueError> {
    let load_failed = |message: String| CueError::LoadFailed {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|e| load_failed(e.to_string()))?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| load_failed(e.to_string()))?;
    Ok(decoder.buffered())
}

impl CueEmitter for GongPlayer {
    fn load(&mut self) -> Result<(), CueError> {
        if self.tx.is_some() {
            return Ok(());
        }
        let (tx, handle) = self.spawn_audio_thread()?;
        debug!(path = %self.path.display(), "gong loaded");
        self.tx = Some(tx);
        self.thread = Some(handle);
        Ok(())
    }

    fn play(&mut self) -> Result<(), CueError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| CueError::Unavailable("gong not loaded".into()))?;
        tx.send(GongCommand::Play)
            .map_err(|e| CueError::PlaybackFailed(e.to_string()))
    }

    fn unload(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(GongCommand::Shutdown);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("gong audio thread panicked");
            }
            debug!(path = %self.path.display(), "gong unloaded");
        }
    }
}

impl Drop for GongPlayer {
    fn drop(&mut self) {
        self.unload();
    }
}
