//! Repair actions
//!
//! One idempotent remediation per issue kind. Dictionary-level fixes run as
//! one transaction per dictionary; change-log deletion and progress
//! clamping are each a single batch transaction. A failed unit rolls back
//! on drop and the caller moves on to the next unit.

use crate::issue::Issue;
use lxb_common::Result;
use sqlx::SqlitePool;
use tracing::debug;

/// Rows removed by an empty-dictionary cascade delete
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeCounts {
    pub sentences: u64,
    pub meaning_items: u64,
    pub progress_rows: u64,
    pub memberships: u64,
}

/// Delete an empty system dictionary and every dependent row.
///
/// Deletion order is children before parents: sentences of the dictionary's
/// meaning items, the meaning items, learning-progress rows, membership
/// rows, then the dictionary itself. All in one transaction.
pub async fn delete_empty_system_dictionary(
    pool: &SqlitePool,
    dict_id: &str,
) -> Result<CascadeCounts> {
    let mut tx = pool.begin().await?;

    let sentences = sqlx::query(
        r#"
        DELETE FROM sentences
        WHERE meaning_item_id IN (
            SELECT id FROM meaning_items WHERE dict_id = ?
        )
        "#,
    )
    .bind(dict_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let meaning_items = sqlx::query("DELETE FROM meaning_items WHERE dict_id = ?")
        .bind(dict_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let progress_rows = sqlx::query("DELETE FROM learning_progress WHERE dict_id = ?")
        .bind(dict_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let memberships = sqlx::query("DELETE FROM dictionary_words WHERE dict_id = ?")
        .bind(dict_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM dictionaries WHERE id = ?")
        .bind(dict_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!(
        dict_id,
        sentences, meaning_items, progress_rows, memberships, "Cascade-deleted empty dictionary"
    );

    Ok(CascadeCounts {
        sentences,
        meaning_items,
        progress_rows,
        memberships,
    })
}

/// Resequence a dictionary's memberships to 1..N preserving their existing
/// order, and optionally correct the declared word count in the same
/// transaction. Only rows whose sequence number actually changes are
/// written; returns how many were.
pub async fn normalize_dictionary(
    pool: &SqlitePool,
    dict_id: &str,
    set_count: Option<i64>,
) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let members: Vec<(String, i64)> =
        sqlx::query_as("SELECT word_id, seq FROM dictionary_words WHERE dict_id = ? ORDER BY seq ASC")
            .bind(dict_id)
            .fetch_all(&mut *tx)
            .await?;

    let mut rewritten = 0u64;
    for (i, (word_id, seq)) in members.iter().enumerate() {
        let expected = i as i64 + 1;
        if *seq != expected {
            sqlx::query(
                r#"
                UPDATE dictionary_words
                SET seq = ?, updated_at = CURRENT_TIMESTAMP
                WHERE dict_id = ? AND word_id = ?
                "#,
            )
            .bind(expected)
            .bind(dict_id)
            .bind(word_id)
            .execute(&mut *tx)
            .await?;
            rewritten += 1;
        }
    }

    if let Some(count) = set_count {
        sqlx::query(
            r#"
            UPDATE dictionaries
            SET word_count = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(count)
        .bind(dict_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!(dict_id, rewritten, "Resequenced dictionary memberships");
    Ok(rewritten)
}

/// Delete the change-log rows named by `VersionExceedsCurrent` issues.
/// Never rewrites a version, only removes the row. One batch transaction.
pub async fn delete_invalid_log_rows(pool: &SqlitePool, issues: &[Issue]) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let mut deleted = 0u64;
    for issue in issues {
        if let Issue::VersionExceedsCurrent { log_id, .. } = issue {
            deleted += sqlx::query("DELETE FROM user_db_logs WHERE id = ?")
                .bind(log_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
    }

    tx.commit().await?;

    debug!(deleted, "Deleted invalid change-log rows");
    Ok(deleted)
}

/// Clamp each overshooting progress row to its dictionary's word count.
/// One batch transaction.
pub async fn clamp_learning_progress(pool: &SqlitePool, issues: &[Issue]) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let mut clamped = 0u64;
    for issue in issues {
        if let Issue::LearningProgressExceeds {
            user_id,
            dict_id,
            word_count,
            ..
        } = issue
        {
            clamped += sqlx::query(
                r#"
                UPDATE learning_progress
                SET current_seq = ?, updated_at = CURRENT_TIMESTAMP
                WHERE user_id = ? AND dict_id = ?
                "#,
            )
            .bind(word_count)
            .bind(user_id)
            .bind(dict_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }
    }

    tx.commit().await?;

    debug!(clamped, "Clamped learning-progress rows");
    Ok(clamped)
}
