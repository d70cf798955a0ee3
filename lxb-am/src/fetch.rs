//! Pending audio download
//!
//! Drains a batch of `kind = 'temp_sound'` sentences: downloads each
//! `temp_sound_url` to `<audio-dir>/<digest>.mp3`, then marks the row
//! `tts`/`need_tts = 0`. Downloads run under a bounded worker pool; one
//! task's failure never aborts the others.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Directory the downloaded `<digest>.mp3` files land in
    pub audio_dir: PathBuf,
    /// Maximum rows drained per run
    pub batch_size: i64,
    /// Concurrent download workers
    pub concurrency: usize,
    /// Producer tag stamped on successfully fetched rows
    pub producer: String,
    /// Per-request timeout
    pub timeout: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub attempted: u64,
    pub fetched: u64,
    pub failed: u64,
    pub skipped: u64,
}

enum RowOutcome {
    Fetched,
    Failed,
    Skipped,
}

/// Download one batch of pending audio and mark the fetched rows
pub async fn fetch_pending_audio(pool: &SqlitePool, opts: &FetchOptions) -> Result<FetchSummary> {
    std::fs::create_dir_all(&opts.audio_dir)
        .with_context(|| format!("Failed to create audio dir {}", opts.audio_dir.display()))?;

    let client = reqwest::Client::builder()
        .timeout(opts.timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let rows: Vec<(String, String, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT id, source_text, digest, temp_sound_url
        FROM sentences
        WHERE kind = 'temp_sound'
        LIMIT ?
        "#,
    )
    .bind(opts.batch_size)
    .fetch_all(pool)
    .await?;

    info!("Loaded {} sentences with pending audio", rows.len());

    if rows.is_empty() {
        return Ok(FetchSummary::default());
    }

    let total = rows.len() as u64;
    let outcomes: Vec<RowOutcome> = stream::iter(rows)
        .map(|(id, source_text, digest, temp_sound_url)| {
            let pool = pool.clone();
            let client = client.clone();
            let audio_dir = opts.audio_dir.clone();
            let producer = opts.producer.clone();

            async move {
                let (Some(digest), Some(url)) = (
                    digest.filter(|d| !d.is_empty()),
                    temp_sound_url.filter(|u| !u.is_empty()),
                ) else {
                    warn!(sentence_id = %id, "Missing digest or URL, skipping");
                    return RowOutcome::Skipped;
                };

                let target = audio_dir.join(format!("{}.mp3", digest));

                match fetch_one(&pool, &client, &id, &url, &target, &producer).await {
                    Ok(()) => {
                        info!(sentence_id = %id, text = %source_text, "Fetched audio");
                        RowOutcome::Fetched
                    }
                    Err(e) => {
                        // Per-row error isolation: the rest of the batch continues
                        error!(sentence_id = %id, url = %url, error = %e, "Fetch failed");
                        RowOutcome::Failed
                    }
                }
            }
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    let mut summary = FetchSummary {
        attempted: total,
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            RowOutcome::Fetched => summary.fetched += 1,
            RowOutcome::Failed => summary.failed += 1,
            RowOutcome::Skipped => summary.skipped += 1,
        }
    }

    info!(
        "{} attempted, {} fetched, {} failed, {} skipped",
        summary.attempted, summary.fetched, summary.failed, summary.skipped
    );

    Ok(summary)
}

async fn fetch_one(
    pool: &SqlitePool,
    client: &reqwest::Client,
    sentence_id: &str,
    url: &str,
    target: &Path,
    producer: &str,
) -> Result<()> {
    download_audio(client, url, target).await?;
    mark_downloaded(pool, sentence_id, producer).await?;
    Ok(())
}

/// Download one audio file; any non-success status is an error
async fn download_audio(client: &reqwest::Client, url: &str, target: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed: {}", url))?
        .error_for_status()
        .with_context(|| format!("Bad status from {}", url))?;

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Body read failed: {}", url))?;

    tokio::fs::write(target, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    Ok(())
}

/// Mark a row's audio as present on disk
pub async fn mark_downloaded(pool: &SqlitePool, sentence_id: &str, producer: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sentences
        SET kind = 'tts', need_tts = 0, producer = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(producer)
    .bind(sentence_id)
    .execute(pool)
    .await?;

    Ok(())
}
