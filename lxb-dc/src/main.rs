//! lxb-dc - Dictionary Consistency Checker
//!
//! Validates the Lexibook vocabulary schema (membership ordering, declared
//! word counts, change-log versions, learning progress, universal-dictionary
//! completeness) and applies guided, transactional repairs under operator
//! confirmation.
//!
//! Exit status: 0 when no issues were found or repairs were applied;
//! 1 when the operator declined repair or validation failed.

use anyhow::Result;
use clap::Parser;
use lxb_dc::{CheckerOptions, RepairDecision, RunOutcome};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments for lxb-dc
#[derive(Parser, Debug)]
#[command(name = "lxb-dc")]
#[command(about = "Consistency checker for the Lexibook vocabulary database")]
#[command(version)]
struct Args {
    /// Path to the database file
    #[arg(short, long, env = "LXB_DATABASE")]
    database: Option<String>,

    /// Owner id marking system-curated dictionaries
    #[arg(long, default_value = "15118", env = "LXB_SYSTEM_OWNER_ID")]
    system_owner_id: String,

    /// Reserved id of the universal dictionary
    #[arg(long, default_value = "0", env = "LXB_UNIVERSAL_DICT_ID")]
    universal_dict_id: String,

    /// Apply repairs without prompting
    #[arg(long)]
    yes: bool,

    /// Report issues but never repair
    #[arg(long, conflicts_with = "yes")]
    report_only: bool,

    /// Export the full report as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
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
        "Starting Lexibook dictionary checker (lxb-dc) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let db_path = lxb_common::config::resolve_database_path(args.database.as_deref(), "LXB_DATABASE")?;
    info!("Database: {}", db_path.display());

    // Connectivity failure is fatal: nothing to check, nothing to repair
    let pool = match lxb_common::db::open_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let decision = if args.yes {
        RepairDecision::Always
    } else if args.report_only {
        RepairDecision::Never
    } else {
        RepairDecision::Prompt
    };

    let opts = CheckerOptions {
        system_owner_id: args.system_owner_id,
        universal_dict_id: args.universal_dict_id,
        decision,
        json_export: args.json,
    };

    let started = std::time::Instant::now();
    let outcome = lxb_dc::orchestrator::run(&pool, &opts).await;
    pool.close().await;
    info!("Run finished in {:.1}s", started.elapsed().as_secs_f64());

    match outcome {
        Ok(RunOutcome::Clean) => {
            info!("Database consistent, nothing to repair");
        }
        Ok(RunOutcome::Repaired(summary)) => {
            if summary.failed_units() > 0 {
                info!(
                    "Repairs applied with {} failed units (rolled back individually)",
                    summary.failed_units()
                );
            } else {
                info!("Repairs applied");
            }
        }
        Ok(RunOutcome::Declined) => {
            info!("Issues found, repair declined");
            std::process::exit(1);
        }
        Err(e) => {
            // Partial results already printed stay visible to the operator
            error!("Validation failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
