use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "breathwork-cli", version, about = "Breathwork CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or simulate a breathing session
    Breathe {
        #[command(subcommand)]
        action: commands::breathe::BreatheAction,
    },
    /// Breath pattern presets and palette
    Pattern {
        #[command(subcommand)]
        action: commands::pattern::PatternAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Free-session count and subscription status
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
}

fn main() {
    // Logs go to stderr; stdout carries JSON events only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Breathe { action } => commands::breathe::run(action),
        Commands::Pattern { action } => commands::pattern::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Session { action } => commands::session::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
