use clap::{Parser, Subcommand};
use std::error::Error;

mod commands;
mod config;

/// Asset schema database management CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for database management
#[derive(Subcommand)]
enum Commands {
    /// Create the database if it does not exist
    Create {
        /// Database name (defaults to the one in DATABASE_URL)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Apply pending migrations
    Migrate {
        /// Number of migrations to apply (all if not specified)
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Drop every table and re-apply all migrations
    Reset,
    /// List applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create { name } => commands::create::execute(name).await?,
        Commands::Migrate { steps } => commands::migrate::execute(steps).await?,
        Commands::Reset => commands::migrate::reset().await?,
        Commands::Status => commands::migrate::status().await?,
    }

    Ok(())
}
