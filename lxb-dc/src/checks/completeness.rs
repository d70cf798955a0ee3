//! Universal-dictionary completeness checker
//!
//! Restricted to the one dictionary with the reserved universal id. Every
//! member word must have at least one meaning item scoped to that
//! dictionary, and every meaning item at least one example sentence. These
//! issues are informational: regenerating the missing content is the job of
//! the external content pipeline, not this tool.

use crate::issue::Issue;
use lxb_common::Result;
use sqlx::SqlitePool;

/// Maximum characters of a gloss quoted in an issue before truncation
const GLOSS_PREVIEW_CHARS: usize = 50;

/// Check the universal dictionary for words without meanings and meanings
/// without sentences. Silently passes when that dictionary does not exist
/// or is empty.
pub async fn check_universal_dictionary(
    pool: &SqlitePool,
    universal_dict_id: &str,
) -> Result<Vec<Issue>> {
    let dict: Option<(String, String)> =
        sqlx::query_as("SELECT id, name FROM dictionaries WHERE id = ?")
            .bind(universal_dict_id)
            .fetch_optional(pool)
            .await?;

    let Some((dict_id, _dict_name)) = dict else {
        return Ok(Vec::new());
    };

    let words: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT dw.word_id, w.spelling
        FROM dictionary_words dw
        JOIN words w ON dw.word_id = w.id
        WHERE dw.dict_id = ?
        ORDER BY dw.seq ASC
        "#,
    )
    .bind(&dict_id)
    .fetch_all(pool)
    .await?;

    let mut issues = Vec::new();

    // Every word and every meaning item is checked; no early exit
    for (word_id, spelling) in words {
        let meanings: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, gloss
            FROM meaning_items
            WHERE word_id = ? AND dict_id = ?
            ORDER BY id
            "#,
        )
        .bind(&word_id)
        .bind(&dict_id)
        .fetch_all(pool)
        .await?;

        if meanings.is_empty() {
            issues.push(Issue::NoMeaning {
                dict_id: dict_id.clone(),
                word_id,
                spelling,
            });
            continue;
        }

        for (meaning_id, gloss) in meanings {
            let sentence_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM sentences WHERE meaning_item_id = ?")
                    .bind(&meaning_id)
                    .fetch_one(pool)
                    .await?;

            if sentence_count == 0 {
                issues.push(Issue::MeaningWithoutSentence {
                    dict_id: dict_id.clone(),
                    word_id: word_id.clone(),
                    spelling: spelling.clone(),
                    meaning_id,
                    gloss_preview: gloss_preview(&gloss),
                });
            }
        }
    }

    Ok(issues)
}

/// Truncate a gloss for report lines. Counts characters, not bytes, so a
/// multibyte gloss never splits mid-codepoint.
fn gloss_preview(gloss: &str) -> String {
    if gloss.chars().count() > GLOSS_PREVIEW_CHARS {
        let truncated: String = gloss.chars().take(GLOSS_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        gloss.to_string()
    }
}
