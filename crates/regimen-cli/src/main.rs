use anyhow::Result;
use clap::{Parser, Subcommand};
use regimen_infrastructure::RegimenPaths;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "regimen")]
#[command(about = "Regimen - step-by-step skincare routine companion", long_about = None)]
struct Cli {
    /// Override the config and data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a routine from a TOML definition
    Run {
        /// Path to the routine file
        routine: PathBuf,
    },
    /// Continue the last unfinished session
    Resume,
    /// Show completed sessions
    History {
        /// Number of sessions to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Discard the unfinished session, if any
    Abandon,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = RegimenPaths::new(cli.data_dir);

    match cli.command {
        Commands::Run { routine } => commands::session::run(&paths, &routine).await?,
        Commands::Resume => commands::session::resume(&paths).await?,
        Commands::History { limit } => commands::history::show(&paths, limit).await?,
        Commands::Abandon => commands::session::abandon(&paths).await?,
    }

    Ok(())
}
