// SPDX-FileCopyrightText: 2026 Volley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Volley - paced campaign dispatch over a durable work queue.
//!
//! This is the binary entry point: it runs delivery workers and exposes the
//! campaign operations (start, pause, resume, stats, log) as subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod bootstrap;
mod input;
mod work;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use volley_config::VolleyConfig;
use volley_core::{CampaignId, VolleyError};

/// Volley - paced campaign dispatch over a durable work queue.
#[derive(Parser, Debug)]
#[command(name = "volley", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the standard lookup paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run delivery workers until SIGINT or SIGTERM.
    Work {
        /// Worker loops to run; defaults to `worker.concurrency`.
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Register a campaign and enqueue one job per contact.
    Start {
        /// Campaign definition (TOML).
        #[arg(long)]
        campaign: PathBuf,
        /// Contacts with `number` and optional `name` columns (CSV).
        #[arg(long)]
        contacts: PathBuf,
    },
    /// Pause a processing campaign.
    Pause { id: String },
    /// Re-enqueue the contacts a paused campaign has not attempted yet.
    Resume { id: String },
    /// Print delivery counts for a campaign as JSON.
    Stats { id: String },
    /// Print the delivery ledger of a campaign as JSON.
    Log { id: String },
    /// Print pending and leased job counts as JSON.
    Depth,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => volley_config::load_and_validate_path(path),
        None => volley_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            volley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.engine.log_level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &VolleyConfig) -> Result<(), VolleyError> {
    let engine = bootstrap::build_engine(config).await?;

    match command {
        Commands::Work { concurrency } => {
            let concurrency = concurrency.unwrap_or(config.worker.concurrency);
            work::run_work(&engine, concurrency).await
        }
        Commands::Start { campaign, contacts } => {
            let definition = input::load_campaign(&campaign)?;
            let contacts = input::load_contacts(&contacts)?;
            let jobs = engine.start_campaign(&definition, &contacts).await?;
            println!("campaign {} started: {jobs} jobs enqueued", definition.id);
            Ok(())
        }
        Commands::Pause { id } => {
            let id = CampaignId::from(id);
            engine.pause_campaign(&id).await?;
            println!("campaign {id} paused");
            Ok(())
        }
        Commands::Resume { id } => {
            let id = CampaignId::from(id);
            let jobs = engine.resume_campaign(&id).await?;
            println!("campaign {id} resumed: {jobs} jobs enqueued");
            Ok(())
        }
        Commands::Stats { id } => print_json(&engine.stats(&CampaignId::from(id)).await?),
        Commands::Log { id } => print_json(&engine.log(&CampaignId::from(id)).await?),
        Commands::Depth => print_json(&engine.queue_depth().await?),
    }
}

fn print_json(value: &impl Serialize) -> Result<(), VolleyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initializes the tracing subscriber on stderr, keeping stdout for command output.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("volley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
