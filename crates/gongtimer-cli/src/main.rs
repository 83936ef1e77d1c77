use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gongtimer-cli", version, about = "Gongtimer meditation timer CLI")]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session in real time
    Run(commands::run::RunArgs),
    /// Tick a session through instantly and report the gongs
    Simulate(commands::simulate::SimulateArgs),
    /// Show how a set of bells is ordered and numbered
    Bells(commands::bells::BellsArgs),
    /// Parse and format duration text
    Duration {
        #[command(subcommand)]
        action: commands::duration::DurationAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match EnvFilter::try_from_env("GONGTIMER_LOG") {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Bells(args) => commands::bells::run(args),
        Commands::Duration { action } => commands::duration::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
