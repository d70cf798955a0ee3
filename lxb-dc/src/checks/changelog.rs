//! Change-log version checker
//!
//! A user's change log drives client sync; a log row whose version exceeds
//! the user's current database version can never be delivered and marks a
//! corrupted sync state. Any excess is a violation, with no tolerance.

use crate::issue::Issue;
use lxb_common::Result;
use sqlx::SqlitePool;

/// Find every change-log row whose version exceeds its user's current
/// database version.
pub async fn check_change_log_versions(pool: &SqlitePool) -> Result<Vec<Issue>> {
    let user_versions: Vec<(String, i64, String)> = sqlx::query_as(
        r#"
        SELECT udv.user_id, udv.version, u.username
        FROM user_db_versions udv
        JOIN users u ON udv.user_id = u.id
        ORDER BY udv.version DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut issues = Vec::new();

    for (user_id, current_version, username) in user_versions {
        let invalid_logs: Vec<(i64, i64, String, String, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT id, version, operation, table_name, record_id, created_at
            FROM user_db_logs
            WHERE user_id = ? AND version > ?
            ORDER BY version DESC
            "#,
        )
        .bind(&user_id)
        .bind(current_version)
        .fetch_all(pool)
        .await?;

        for (log_id, log_version, operation, table_name, record_id, created_at) in invalid_logs {
            issues.push(Issue::VersionExceedsCurrent {
                user_id: user_id.clone(),
                username: username.clone(),
                log_id,
                log_version,
                current_version,
                operation,
                table_name,
                record_id,
                created_at,
            });
        }
    }

    Ok(issues)
}
