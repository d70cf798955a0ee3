//! Sentence audio verification
//!
//! Checks every `kind = 'tts'` sentence of one producer against the audio
//! directory: the file `<digest>.mp3` must exist and be non-empty. Healthy
//! files are copied into an export directory; unhealthy rows are flipped
//! back into the pipeline — `no_sound`/`need_tts` when no download URL was
//! ever recorded (regenerate), `temp_sound` when one was (redownload).

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Directory holding `<digest>.mp3` files
    pub audio_dir: PathBuf,
    /// Directory healthy files are copied into
    pub export_dir: PathBuf,
    /// Producer tag whose sentences are audited
    pub producer: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifySummary {
    pub checked: u64,
    pub healthy: u64,
    pub flagged_regenerate: u64,
    pub flagged_redownload: u64,
    pub skipped: u64,
}

impl VerifySummary {
    pub fn unhealthy(&self) -> u64 {
        self.flagged_regenerate + self.flagged_redownload
    }
}

/// Audit sentence audio files and flip unhealthy rows for reprocessing.
/// Each flip commits on its own; a crash mid-run loses nothing already done.
pub async fn verify_sentence_audio(
    pool: &SqlitePool,
    opts: &VerifyOptions,
) -> Result<VerifySummary> {
    std::fs::create_dir_all(&opts.export_dir)
        .with_context(|| format!("Failed to create export dir {}", opts.export_dir.display()))?;

    let rows: Vec<(String, String, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        SELECT id, source_text, digest, temp_sound_url
        FROM sentences
        WHERE kind = 'tts' AND producer = ?
        "#,
    )
    .bind(&opts.producer)
    .fetch_all(pool)
    .await?;

    info!("Loaded {} sentences to verify", rows.len());

    let mut summary = VerifySummary::default();
    for (id, source_text, digest, temp_sound_url) in rows {
        summary.checked += 1;

        let Some(digest) = digest.filter(|d| !d.is_empty()) else {
            warn!(sentence_id = %id, "Sentence has no audio digest, skipping");
            summary.skipped += 1;
            continue;
        };

        let file_name = format!("{}.mp3", digest);
        let mp3_path = opts.audio_dir.join(&file_name);

        if audio_file_healthy(&mp3_path) {
            let copied = opts.export_dir.join(&file_name);
            std::fs::copy(&mp3_path, &copied)
                .with_context(|| format!("Failed to copy {} to export dir", mp3_path.display()))?;
            summary.healthy += 1;
        } else {
            warn!(
                sentence_id = %id,
                text = %source_text,
                file = %mp3_path.display(),
                "Audio file missing or empty"
            );

            let url_recorded = temp_sound_url.as_deref().is_some_and(|u| !u.is_empty());
            if url_recorded {
                // Generated remotely but the download never landed
                mark_for_redownload(pool, &id).await?;
                summary.flagged_redownload += 1;
            } else {
                mark_for_regeneration(pool, &id, &opts.producer).await?;
                summary.flagged_regenerate += 1;
            }
        }

        if summary.checked % 1000 == 0 {
            info!(
                "{} sentences checked, {} unhealthy so far",
                summary.checked,
                summary.unhealthy()
            );
        }
    }

    info!(
        "{} sentences checked, {} healthy, {} unhealthy, {} skipped",
        summary.checked,
        summary.healthy,
        summary.unhealthy(),
        summary.skipped
    );

    Ok(summary)
}

/// A healthy audio file exists and is non-empty
fn audio_file_healthy(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// Send the row back to the generation queue
pub async fn mark_for_regeneration(pool: &SqlitePool, sentence_id: &str, producer: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sentences
        SET kind = 'no_sound', need_tts = 1, producer = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(producer)
    .bind(sentence_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Send the row back to the download queue (audio was generated, fetch it again)
pub async fn mark_for_redownload(pool: &SqlitePool, sentence_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sentences
        SET kind = 'temp_sound', updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(sentence_id)
    .execute(pool)
    .await?;

    Ok(())
}
