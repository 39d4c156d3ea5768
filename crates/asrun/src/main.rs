//! asrun - broadcast as-run log ingestion and cut dispatch

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use asrun::db::{cursor_repo, media_repo};
use asrun::logging::{init_logging, LogFormat};
use asrun::{load_config, App};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "asrun")]
#[command(author, version, about = "Ingest broadcast as-run logs and dispatch cut jobs")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, env = "ASRUN_CONFIG", default_value = "asrun.json")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the configured directory and ingest new files (default)
    Watch {
        /// Also ingest matching files already in the directory at startup
        #[arg(long)]
        scan_existing: bool,
    },

    /// Ingest a single file once
    Ingest {
        file: PathBuf,

        /// Keep running until every dispatched job has finished
        #[arg(long)]
        wait: bool,
    },

    /// Show record counts and the latest ingest cursor
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(level, format).context("initializing logging")?;

    let config = load_config(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let app = App::from_config(config)?;

    match cli.command.unwrap_or(Command::Watch {
        scan_existing: false,
    }) {
        Command::Watch { scan_existing } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            spawn_ctrl_c(Arc::clone(&shutdown));
            app.watch(scan_existing, shutdown).await?;
        }
        Command::Ingest { file, wait } => {
            let report = app.pipeline().ingest(&file).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if wait {
                let shutdown = Arc::new(AtomicBool::new(false));
                spawn_ctrl_c(Arc::clone(&shutdown));
                while app.scheduler().is_running() && !shutdown.load(Ordering::Relaxed) {
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
            }
            app.scheduler().stop().await;
        }
        Command::Status => {
            for (status, count) in media_repo::status_counts(app.database())? {
                println!("{:<16} {}", status, count);
            }
            match cursor_repo::latest(app.database())? {
                Some(cursor) => println!(
                    "cursor           {} line {} ({})",
                    cursor.filename, cursor.total_lines, cursor.created_at
                ),
                None => println!("cursor           none"),
            }
        }
    }

    Ok(())
}

fn spawn_ctrl_c(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.store(true, Ordering::Relaxed);
        }
    });
}
