//! Integration tests for sentence audio maintenance
//!
//! Each test builds an in-memory database with the shared schema and a
//! temporary audio directory; fetch failure paths use an unreachable local
//! URL so no live network is involved.

use lxb_am::fetch::{fetch_pending_audio, FetchOptions, FetchSummary};
use lxb_am::verify::{verify_sentence_audio, VerifyOptions};
use lxb_common::db::create_schema;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;

/// Single connection so every query sees the same in-memory database
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    create_schema(&pool).await.expect("Failed to create schema");
    pool
}

/// Seed the parent rows a sentence needs, then the sentence itself
async fn insert_sentence(
    pool: &SqlitePool,
    id: &str,
    digest: Option<&str>,
    kind: &str,
    producer: &str,
    temp_sound_url: Option<&str>,
) {
    sqlx::query("INSERT OR IGNORE INTO users (id, username) VALUES ('u1', 'alice')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT OR IGNORE INTO dictionaries (id, name, owner_id, word_count) VALUES ('d1', 'List', 'u1', 0)",
    )
    .execute(pool)
    .await
    .unwrap();
    sqlx::query("INSERT OR IGNORE INTO words (id, spelling) VALUES ('w1', 'apple')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT OR IGNORE INTO meaning_items (id, word_id, dict_id, gloss) VALUES ('m1', 'w1', 'd1', 'a fruit')",
    )
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        r#"
        INSERT INTO sentences (id, meaning_item_id, source_text, digest, kind, producer, temp_sound_url)
        VALUES (?, 'm1', 'An example sentence.', ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(digest)
    .bind(kind)
    .bind(producer)
    .bind(temp_sound_url)
    .execute(pool)
    .await
    .unwrap();
}

async fn sentence_state(pool: &SqlitePool, id: &str) -> (String, bool) {
    sqlx::query_as("SELECT kind, need_tts FROM sentences WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn healthy_audio_is_copied_and_left_alone() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();

    std::fs::write(audio.path().join("abc123.mp3"), b"mp3-bytes").unwrap();
    insert_sentence(&pool, "s1", Some("abc123"), "tts", "remote", None).await;

    let opts = VerifyOptions {
        audio_dir: audio.path().to_path_buf(),
        export_dir: export.path().to_path_buf(),
        producer: "remote".to_string(),
    };
    let summary = verify_sentence_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.healthy, 1);
    assert_eq!(summary.unhealthy(), 0);

    assert!(export.path().join("abc123.mp3").exists());
    assert_eq!(sentence_state(&pool, "s1").await, ("tts".to_string(), false));
}

#[tokio::test]
async fn missing_audio_without_url_is_flagged_for_regeneration() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();

    insert_sentence(&pool, "s1", Some("gone111"), "tts", "remote", None).await;

    let opts = VerifyOptions {
        audio_dir: audio.path().to_path_buf(),
        export_dir: export.path().to_path_buf(),
        producer: "remote".to_string(),
    };
    let summary = verify_sentence_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.flagged_regenerate, 1);
    assert_eq!(summary.flagged_redownload, 0);
    assert_eq!(
        sentence_state(&pool, "s1").await,
        ("no_sound".to_string(), true)
    );
}

#[tokio::test]
async fn missing_audio_with_url_is_flagged_for_redownload() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();

    insert_sentence(
        &pool,
        "s1",
        Some("gone222"),
        "tts",
        "remote",
        Some("http://cdn.example/audio/gone222.mp3"),
    )
    .await;

    let opts = VerifyOptions {
        audio_dir: audio.path().to_path_buf(),
        export_dir: export.path().to_path_buf(),
        producer: "remote".to_string(),
    };
    let summary = verify_sentence_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.flagged_redownload, 1);
    assert_eq!(summary.flagged_regenerate, 0);
    assert_eq!(
        sentence_state(&pool, "s1").await,
        ("temp_sound".to_string(), false)
    );
}

#[tokio::test]
async fn empty_audio_file_counts_as_unhealthy() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();

    std::fs::write(audio.path().join("empty33.mp3"), b"").unwrap();
    insert_sentence(&pool, "s1", Some("empty33"), "tts", "remote", None).await;

    let opts = VerifyOptions {
        audio_dir: audio.path().to_path_buf(),
        export_dir: export.path().to_path_buf(),
        producer: "remote".to_string(),
    };
    let summary = verify_sentence_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.healthy, 0);
    assert_eq!(summary.flagged_regenerate, 1);
}

#[tokio::test]
async fn other_producers_and_kinds_are_not_audited() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();

    insert_sentence(&pool, "s1", Some("aaa"), "tts", "elsewhere", None).await;
    insert_sentence(&pool, "s2", Some("bbb"), "temp_sound", "remote", None).await;

    let opts = VerifyOptions {
        audio_dir: audio.path().to_path_buf(),
        export_dir: export.path().to_path_buf(),
        producer: "remote".to_string(),
    };
    let summary = verify_sentence_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.checked, 0);
    assert_eq!(sentence_state(&pool, "s1").await, ("tts".to_string(), false));
    assert_eq!(
        sentence_state(&pool, "s2").await,
        ("temp_sound".to_string(), false)
    );
}

#[tokio::test]
async fn blank_digest_is_skipped_not_fatal() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();
    let export = TempDir::new().unwrap();

    insert_sentence(&pool, "s1", Some(""), "tts", "remote", None).await;

    let opts = VerifyOptions {
        audio_dir: audio.path().to_path_buf(),
        export_dir: export.path().to_path_buf(),
        producer: "remote".to_string(),
    };
    let summary = verify_sentence_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.unhealthy(), 0);
}

/// A failed download leaves the row queued and is isolated from the batch
#[tokio::test]
async fn failed_download_keeps_row_pending() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();

    // Nothing listens on the discard port; connection is refused immediately
    insert_sentence(
        &pool,
        "s1",
        Some("down444"),
        "temp_sound",
        "remote",
        Some("http://127.0.0.1:9/down444.mp3"),
    )
    .await;

    let opts = FetchOptions {
        audio_dir: audio.path().to_path_buf(),
        batch_size: 20,
        concurrency: 5,
        producer: "remote".to_string(),
        timeout: Duration::from_secs(2),
    };
    let summary = fetch_pending_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.fetched, 0);

    // Row is untouched and will be retried next run
    assert_eq!(
        sentence_state(&pool, "s1").await,
        ("temp_sound".to_string(), false)
    );
    assert!(!audio.path().join("down444.mp3").exists());
}

#[tokio::test]
async fn rows_without_digest_or_url_are_skipped() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();

    insert_sentence(&pool, "s1", None, "temp_sound", "remote", Some("http://127.0.0.1:9/x.mp3")).await;
    insert_sentence(&pool, "s2", Some("nourl55"), "temp_sound", "remote", None).await;

    let opts = FetchOptions {
        audio_dir: audio.path().to_path_buf(),
        batch_size: 20,
        concurrency: 5,
        producer: "remote".to_string(),
        timeout: Duration::from_secs(2),
    };
    let summary = fetch_pending_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn batch_size_bounds_one_run() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();

    for i in 0..5 {
        insert_sentence(
            &pool,
            &format!("s{}", i),
            Some(&format!("digest{}", i)),
            "temp_sound",
            "remote",
            Some("http://127.0.0.1:9/audio.mp3"),
        )
        .await;
    }

    let opts = FetchOptions {
        audio_dir: audio.path().to_path_buf(),
        batch_size: 2,
        concurrency: 5,
        producer: "remote".to_string(),
        timeout: Duration::from_secs(2),
    };
    let summary = fetch_pending_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary.attempted, 2);
}

#[tokio::test]
async fn empty_queue_is_a_quiet_noop() {
    let pool = test_pool().await;
    let audio = TempDir::new().unwrap();

    let opts = FetchOptions {
        audio_dir: audio.path().to_path_buf(),
        batch_size: 20,
        concurrency: 5,
        producer: "remote".to_string(),
        timeout: Duration::from_secs(2),
    };
    let summary = fetch_pending_audio(&pool, &opts).await.unwrap();

    assert_eq!(summary, FetchSummary::default());
}
