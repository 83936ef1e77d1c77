use clap::Subcommand;
use gongtimer_core::duration::canonicalize;
use gongtimer_core::error::Result;
use gongtimer_core::{format_seconds, parse_to_seconds, ValidationError};

#[derive(Subcommand)]
pub enum DurationAction {
    /// Print the number of seconds in MM:SS or HH:MM:SS text
    Parse {
        text: String,
        /// Print the canonical text instead of seconds
        #[arg(long)]
        canonical: bool,
    },
    /// Print seconds as MM:SS, or HH:MM:SS from one hour up
    Format { secs: u64 },
}

pub fn run(action: DurationAction) -> Result<()> {
    match action {
        DurationAction::Parse { text, canonical } => {
            if canonical {
                let out = canonicalize(&text)
                    .ok_or_else(|| ValidationError::InvalidDuration { text: text.clone() })?;
                println!("{out}");
            } else {
                let secs = parse_to_seconds(&text).into_result()?;
                println!("{secs}");
            }
        }
        DurationAction::Format { secs } => {
            println!("{}", format_seconds(secs));
        }
    }
    Ok(())
}
