//! Database initialization
//!
//! The vocabulary schema is owned by the Lexibook backend; the maintenance
//! tools create it only so that a fresh database and the test suite have the
//! full shape. All table creation is idempotent.

use crate::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open an existing database for maintenance work.
///
/// Refuses to run against a missing file: a maintenance tool that silently
/// creates an empty store would then "verify" nothing.
pub async fn open_database(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Database not found: {}",
            db_path.display()
        )));
    }

    let db_url = format!("sqlite://{}?mode=rw", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    apply_pragmas(&pool).await?;

    info!("Opened database: {}", db_path.display());
    Ok(pool)
}

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    apply_pragmas(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    // WAL mode allows concurrent readers while a maintenance run writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create all tables of the vocabulary schema (idempotent - safe to call
/// multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_words_table(pool).await?;
    create_dictionaries_table(pool).await?;
    create_dictionary_words_table(pool).await?;
    create_meaning_items_table(pool).await?;
    create_sentences_table(pool).await?;
    create_learning_progress_table(pool).await?;
    create_user_db_versions_table(pool).await?;
    create_user_db_logs_table(pool).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_words_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS words (
            id TEXT PRIMARY KEY,
            spelling TEXT NOT NULL,
            pronunciation TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_words_spelling ON words(spelling)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the dictionaries table
///
/// A dictionary owned by the reserved system owner id is a system-curated
/// word list; `word_count` is denormalized and must track the number of
/// membership rows.
pub async fn create_dictionaries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dictionaries (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            word_count INTEGER NOT NULL DEFAULT 0,
            visible INTEGER NOT NULL DEFAULT 1,
            is_ready INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (word_count >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_dictionaries_owner ON dictionaries(owner_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the dictionary_words membership table
///
/// Within one dictionary the `seq` column must form a contiguous run 1..N.
pub async fn create_dictionary_words_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dictionary_words (
            dict_id TEXT NOT NULL REFERENCES dictionaries(id),
            word_id TEXT NOT NULL REFERENCES words(id),
            seq INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (dict_id, word_id),
            CHECK (seq > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_dictionary_words_seq ON dictionary_words(dict_id, seq)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the meaning_items table
///
/// A meaning item is one sense of a word scoped to one dictionary. The
/// `is_updating`/`updating_start_at` columns are a lease marker written by
/// external enrichment processes; the maintenance tools never touch them.
pub async fn create_meaning_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meaning_items (
            id TEXT PRIMARY KEY,
            word_id TEXT NOT NULL REFERENCES words(id),
            dict_id TEXT NOT NULL REFERENCES dictionaries(id),
            pos_tag TEXT,
            gloss TEXT NOT NULL,
            is_updating INTEGER NOT NULL DEFAULT 0,
            updating_start_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_meaning_items_word_dict ON meaning_items(word_id, dict_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_meaning_items_dict ON meaning_items(dict_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the sentences table
///
/// `digest` names the audio file on disk; `kind` is the audio lifecycle
/// state: `tts` = audio present, `temp_sound` = generated remotely and
/// awaiting download, `no_sound` = needs regeneration.
pub async fn create_sentences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sentences (
            id TEXT PRIMARY KEY,
            meaning_item_id TEXT NOT NULL REFERENCES meaning_items(id),
            source_text TEXT NOT NULL,
            target_text TEXT,
            digest TEXT,
            kind TEXT NOT NULL DEFAULT 'tts' CHECK (kind IN ('tts', 'temp_sound', 'no_sound')),
            producer TEXT,
            need_tts INTEGER NOT NULL DEFAULT 0,
            temp_sound_url TEXT,
            is_updating INTEGER NOT NULL DEFAULT 0,
            updating_start_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sentences_meaning_item ON sentences(meaning_item_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sentences_kind ON sentences(kind)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_learning_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learning_progress (
            user_id TEXT NOT NULL REFERENCES users(id),
            dict_id TEXT NOT NULL REFERENCES dictionaries(id),
            current_seq INTEGER NOT NULL DEFAULT 0,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, dict_id),
            CHECK (current_seq >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_db_versions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_db_versions (
            user_id TEXT PRIMARY KEY REFERENCES users(id),
            version INTEGER NOT NULL DEFAULT 0,
            CHECK (version >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the user_db_logs change-log table
///
/// Log rows drive client sync; no row's `version` may exceed the user's
/// current version in user_db_versions.
pub async fn create_user_db_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_db_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id),
            version INTEGER NOT NULL,
            operation TEXT NOT NULL,
            table_name TEXT NOT NULL,
            record_id TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_user_db_logs_user_version ON user_db_logs(user_id, version)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
