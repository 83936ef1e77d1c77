use clap::Args;
use gongtimer_core::duration::resolve_route_duration;
use gongtimer_core::error::Result;
use gongtimer_core::{
    format_seconds, BellId, BellScheduler, BellSet, Config, NewBell, ValidationError,
};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct BellsArgs {
    /// Bell time after the start (repeatable)
    #[arg(short, long = "time", required = true)]
    pub times: Vec<String>,
    /// Remove a bell by id after adding (repeatable)
    #[arg(short, long = "remove")]
    pub remove: Vec<BellId>,
    /// Session length used to work out when each bell rings
    #[arg(short, long)]
    pub duration: Option<String>,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct BellRow {
    id: BellId,
    time: String,
    label: String,
    subtitle: String,
    /// Countdown value at which the bell rings; `None` if it never does.
    rings_at: Option<String>,
}

fn rows(set: &BellSet, total_secs: u64) -> Vec<BellRow> {
    set.ordered()
        .map(|bell| BellRow {
            id: bell.id,
            time: bell.time.clone(),
            label: bell.label.clone(),
            subtitle: bell.subtitle.clone(),
            rings_at: BellScheduler::trigger_remaining(total_secs, bell).map(format_seconds),
        })
        .collect()
}

pub fn run(args: BellsArgs) -> Result<()> {
    let config = Config::load()?;
    let total_secs = match &args.duration {
        Some(text) => resolve_route_duration(Some(text)),
        None => config.default_duration_secs(),
    };

    let mut set = BellSet::new();
    for time in &args.times {
        set.add(
            NewBell::at(time.as_str())
                .with_label(config.bell.default_label.as_str())
                .with_subtitle(config.bell.default_subtitle.as_str()),
        )?;
    }
    for id in &args.remove {
        if set.remove(*id).is_none() {
            return Err(ValidationError::UnknownBell { id: *id }.into());
        }
    }

    let rows = rows(&set, total_secs);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("session {}", format_seconds(total_secs));
    for row in &rows {
        let rings = row.rings_at.as_deref().unwrap_or("never");
        println!("{:>3}  {}  {}  (rings with {} left)", row.id, row.time, row.label, rings);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_mark_unreachable_bells() {
        let mut set = BellSet::new();
        set.add(NewBell::at("02:00")).unwrap();
        set.add(NewBell::at("00:15")).unwrap();
        let rows = rows(&set, 60);
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[0].rings_at.as_deref(), Some("00:45"));
        assert_eq!(rows[1].rings_at, None);
    }
}
