//! NEXUS SQL Forge - trace slow SQL back to the Laravel code that issues it
//!
//! Indexes the query-shaped lines of a Laravel project as embeddings, then
//! matches a pasted SQL statement to its most likely origin and reports on
//! validation and performance around it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod analysis;
mod cli;
mod config;
mod embed;
mod error;
mod index;
mod service;

/// NEXUS SQL Forge - find the code behind your queries
#[derive(Parser)]
#[command(name = "nexus-sql")]
#[command(author = "Mustafa Saraç <mustafa@mustafasarac.com>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Match SQL queries to the Laravel code that runs them", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "NEXUS_SQL_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the SQL-related code of a Laravel project
    Index {
        /// Project root (defaults to general.project_path, then the current directory)
        path: Option<String>,
    },

    /// Match a SQL query to its source line and analyze it
    Analyze {
        /// SQL text; read from --file or stdin when omitted
        sql: Option<String>,

        /// Read the query from a file
        #[arg(short, long, conflicts_with = "sql")]
        file: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize configuration file
        #[arg(long)]
        init: bool,
    },

    /// Show version, backend and index status
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `analyze --json` output stays clean
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = config::load_config(cli.config.as_deref())?;

    debug!("NEXUS SQL Forge v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Index { path } => {
            cli::index::run(config, path.as_deref()).await?;
        }
        Commands::Analyze { sql, file, json } => {
            cli::analyze::run(config, sql.as_deref(), file.as_deref(), json).await?;
        }
        Commands::Config { show, init } => {
            if init {
                config::init_config(cli.config.as_deref())?;
            } else if show {
                config::show_config(&config)?;
            } else {
                println!("Config file: {}", config::config_path()?.display());
                println!("Use --show to print it or --init to create it.");
            }
        }
        Commands::Info => {
            cli::info::run(config).await?;
        }
    }

    Ok(())
}
