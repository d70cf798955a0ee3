//! lxb-am - Sentence Audio Maintenance
//!
//! `verify` audits sentence audio files on disk against the database and
//! flips unhealthy rows back into the regeneration/redownload queue.
//! `fetch` downloads remotely generated audio awaiting pickup.
//!
//! Exit status: 0 on success; `fetch` exits 1 when any row failed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lxb_am::fetch::{fetch_pending_audio, FetchOptions};
use lxb_am::verify::{verify_sentence_audio, VerifyOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Command-line arguments for lxb-am
#[derive(Parser, Debug)]
#[command(name = "lxb-am")]
#[command(about = "Sentence audio maintenance for the Lexibook database")]
#[command(version)]
struct Args {
    /// Path to the database file
    #[arg(short, long, env = "LXB_DATABASE")]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check audio files on disk and flip unhealthy rows for reprocessing
    Verify {
        /// Directory holding <digest>.mp3 files
        #[arg(long, env = "LXB_AUDIO_DIR")]
        audio_dir: PathBuf,

        /// Directory healthy files are copied into
        #[arg(long, env = "LXB_AUDIO_EXPORT_DIR")]
        export_dir: PathBuf,

        /// Producer tag whose sentences are audited
        #[arg(long, default_value = "remote")]
        producer: String,
    },

    /// Download pending generated audio and mark the rows
    Fetch {
        /// Directory the downloaded files land in
        #[arg(long, env = "LXB_AUDIO_DIR")]
        audio_dir: PathBuf,

        /// Maximum rows drained per run
        #[arg(long, default_value_t = 20)]
        batch_size: i64,

        /// Concurrent download workers
        #[arg(long, default_value_t = 5)]
        concurrency: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 15)]
        timeout_secs: u64,

        /// Producer tag stamped on fetched rows
        #[arg(long, default_value = "remote")]
        producer: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Lexibook audio maintenance (lxb-am) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let db_path = lxb_common::config::resolve_database_path(args.database.as_deref(), "LXB_DATABASE")?;
    info!("Database: {}", db_path.display());

    let pool = match lxb_common::db::open_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let failed = match args.command {
        Command::Verify {
            audio_dir,
            export_dir,
            producer,
        } => {
            let opts = VerifyOptions {
                audio_dir,
                export_dir,
                producer,
            };
            let summary = verify_sentence_audio(&pool, &opts).await?;
            info!(
                "Verify done: {} checked, {} healthy, {} flagged for regeneration, {} for redownload",
                summary.checked,
                summary.healthy,
                summary.flagged_regenerate,
                summary.flagged_redownload
            );
            0
        }
        Command::Fetch {
            audio_dir,
            batch_size,
            concurrency,
            timeout_secs,
            producer,
        } => {
            let opts = FetchOptions {
                audio_dir,
                batch_size,
                concurrency,
                producer,
                timeout: Duration::from_secs(timeout_secs),
            };
            let summary = fetch_pending_audio(&pool, &opts).await?;
            if summary.failed > 0 {
                error!("{} downloads failed", summary.failed);
            }
            summary.failed
        }
    };

    pool.close().await;
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
