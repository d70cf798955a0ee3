//! Membership order & count checker
//!
//! For one dictionary: loads all membership rows ordered by sequence number
//! (joined to word spelling for reporting) and evaluates five independent
//! checks — emptiness, declared-count mismatch, non-canonical start,
//! per-row discontinuity, and max-index mismatch. All checks run
//! unconditionally; the result is valid only when no issue was produced.

use crate::issue::Issue;
use lxb_common::db::models::Dictionary;
use lxb_common::Result;
use sqlx::SqlitePool;

/// Load all dictionaries subject to checking: visible, ready, newest first
pub async fn load_checked_dictionaries(pool: &SqlitePool) -> Result<Vec<Dictionary>> {
    let dicts = sqlx::query_as::<_, Dictionary>(
        r#"
        SELECT id, name, owner_id, word_count, visible, is_ready
        FROM dictionaries
        WHERE visible = 1 AND is_ready = 1
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(dicts)
}

/// Resolve a dictionary owner id to a display name
pub async fn resolve_owner_name(
    pool: &SqlitePool,
    owner_id: &str,
    system_owner_id: &str,
) -> Result<String> {
    if owner_id == system_owner_id {
        return Ok("system".to_string());
    }

    let username: Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id = ?")
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

    Ok(username
        .map(|(name,)| name)
        .unwrap_or_else(|| format!("user {}", owner_id)))
}

/// Check one dictionary's membership ordering and declared count.
///
/// Returns the full issue list; the dictionary is valid iff the list is
/// empty.
pub async fn check_dictionary(
    pool: &SqlitePool,
    dict: &Dictionary,
    system_owner_id: &str,
) -> Result<Vec<Issue>> {
    let members: Vec<(String, i64, String)> = sqlx::query_as(
        r#"
        SELECT dw.word_id, dw.seq, w.spelling
        FROM dictionary_words dw
        JOIN words w ON dw.word_id = w.id
        WHERE dw.dict_id = ?
        ORDER BY dw.seq ASC
        "#,
    )
    .bind(&dict.id)
    .fetch_all(pool)
    .await?;

    let mut issues = Vec::new();

    if members.is_empty() {
        // An empty system-curated dictionary is itself the anomaly
        if dict.owner_id == system_owner_id {
            issues.push(Issue::EmptySystemDict {
                dict_id: dict.id.clone(),
                dict_name: dict.name.clone(),
                owner_id: dict.owner_id.clone(),
                declared_count: dict.word_count,
            });
        } else if dict.word_count != 0 {
            issues.push(Issue::WordCountMismatch {
                dict_id: dict.id.clone(),
                dict_name: dict.name.clone(),
                declared_count: dict.word_count,
                actual_count: 0,
            });
        }
        return Ok(issues);
    }

    let total = members.len() as i64;

    if total != dict.word_count {
        issues.push(Issue::WordCountMismatch {
            dict_id: dict.id.clone(),
            dict_name: dict.name.clone(),
            declared_count: dict.word_count,
            actual_count: total,
        });
    }

    let (first_word_id, first_seq, first_spelling) = &members[0];
    if *first_seq != 1 {
        issues.push(Issue::NotStartFromOne {
            dict_id: dict.id.clone(),
            position: 1,
            word_id: first_word_id.clone(),
            spelling: first_spelling.clone(),
            expected: 1,
            actual: *first_seq,
        });
    }

    // One issue per offending row, not just the first gap
    for (i, (word_id, seq, spelling)) in members.iter().enumerate() {
        let expected = i as i64 + 1;
        if *seq != expected {
            issues.push(Issue::Discontinuous {
                dict_id: dict.id.clone(),
                position: expected,
                word_id: word_id.clone(),
                spelling: spelling.clone(),
                expected,
                actual: *seq,
            });
        }
    }

    if let Some((last_word_id, last_seq, last_spelling)) = members.last() {
        if *last_seq != total {
            issues.push(Issue::MaxIndexError {
                dict_id: dict.id.clone(),
                position: total,
                word_id: last_word_id.clone(),
                spelling: last_spelling.clone(),
                expected: total,
                actual: *last_seq,
            });
        }
    }

    Ok(issues)
}
