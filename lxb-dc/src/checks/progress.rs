//! Learning-progress checker

use crate::issue::Issue;
use lxb_common::Result;
use sqlx::SqlitePool;

/// Find every (user, dictionary) progress row whose position exceeds the
/// dictionary's declared word count. One set-based query.
pub async fn check_learning_progress(pool: &SqlitePool) -> Result<Vec<Issue>> {
    let rows: Vec<(String, String, String, String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT lp.user_id, u.username, lp.dict_id, d.name, lp.current_seq, d.word_count
        FROM learning_progress lp
        JOIN users u ON lp.user_id = u.id
        JOIN dictionaries d ON lp.dict_id = d.id
        WHERE lp.current_seq > d.word_count
        ORDER BY lp.user_id, lp.dict_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let issues = rows
        .into_iter()
        .map(
            |(user_id, username, dict_id, dict_name, current_seq, word_count)| {
                Issue::LearningProgressExceeds {
                    user_id,
                    username,
                    dict_id,
                    dict_name,
                    current_seq,
                    word_count,
                }
            },
        )
        .collect();

    Ok(issues)
}
