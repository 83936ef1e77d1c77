use std::io::Write;

use clap::Args;
use gongtimer_core::error::{CoreError, Result};
use gongtimer_core::{
    format_seconds, Config, CueEmitter, Event, MeditationSession, NewBell, SessionRunner,
    SessionStore, SilentCue, TerminalBell,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::{describe, SessionArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Do not strike the gong
    #[arg(long)]
    pub silent: bool,
}

#[cfg(feature = "audio")]
fn sound_cue(config: &Config) -> Option<Box<dyn CueEmitter>> {
    config.cue.sound.as_ref().map(|sound| {
        Box::new(gongtimer_core::GongPlayer::new(sound, config.cue.volume)) as Box<dyn CueEmitter>
    })
}

#[cfg(not(feature = "audio"))]
fn sound_cue(config: &Config) -> Option<Box<dyn CueEmitter>> {
    if config.cue.sound.is_some() {
        tracing::warn!("cue.sound is set but this build has no audio support; using the terminal bell");
    }
    None
}

fn build_cue(config: &Config, silent: bool) -> Box<dyn CueEmitter> {
    if silent || !config.cue.enabled {
        return Box::new(SilentCue);
    }
    sound_cue(config).unwrap_or_else(|| Box::new(TerminalBell::stdout()))
}

enum Input {
    Toggle,
    Quit,
    AddBell(String),
    RemoveBell(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line == "q" || line == "quit" {
        return Input::Quit;
    }
    match line.split_once(' ') {
        Some(("bell", time)) => Input::AddBell(time.trim().to_string()),
        Some(("unbell", id)) => Input::RemoveBell(id.trim().to_string()),
        _ => Input::Toggle,
    }
}

fn print_event(event: &Event) {
    match event {
        Event::Tick { remaining_secs, .. } => {
            print!("\r{}   ", format_seconds(*remaining_secs));
            let _ = std::io::stdout().flush();
        }
        other => {
            if let Some(line) = describe(other) {
                println!("\r{line}");
            }
        }
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = Config::load()?;
    let store = SessionStore::new(args.session.to_session_config(&config)?);
    let cue = build_cue(&config, args.silent);
    let tick_interval = config.tick_interval();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (runner, mut events) =
            SessionRunner::new(MeditationSession::from_store(&store), cue, tick_interval);
        let mut runner = runner.with_store(store.clone());

        println!("Enter pauses/resumes, 'bell MM:SS' adds a bell, 'unbell ID' removes one, q quits");
        runner.start().await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    print_event(&event);
                    if matches!(event, Event::SessionCompleted { .. }) {
                        break;
                    }
                }
                line = lines.next_line(), if stdin_open => {
                    let Some(line) = line? else {
                        stdin_open = false;
                        continue;
                    };
                    match parse_input(&line) {
                        Input::Quit => break,
                        Input::Toggle => {
                            runner.toggle().await;
                        }
                        Input::AddBell(time) => match store.add_bell(
                            NewBell::at(time)
                                .with_label(config.bell.default_label.as_str())
                                .with_subtitle(config.bell.default_subtitle.as_str()),
                        ) {
                            Ok(id) => info!(bell_id = id, "bell added"),
                            Err(e) => eprintln!("\r{e}"),
                        },
                        Input::RemoveBell(id) => match id.parse::<u32>() {
                            Ok(id) => {
                                if let Err(e) = store.remove_bell(id) {
                                    eprintln!("\r{e}");
                                }
                            }
                            Err(_) => eprintln!("\rnot a bell id: {id}"),
                        },
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        if let Event::StateSnapshot { remaining_text, .. } = runner.snapshot().await {
            println!("\rremaining: {remaining_text}");
        }
        runner.shutdown().await;
        Ok::<(), CoreError>(())
    })
}
