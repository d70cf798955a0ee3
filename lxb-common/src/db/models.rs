//! Database models

use serde::{Deserialize, Serialize};

/// A dictionary (ordered word list). `owner_id` equal to the reserved system
/// owner id marks a system-curated dictionary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dictionary {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub word_count: i64,
    pub visible: bool,
    pub is_ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Word {
    pub id: String,
    pub spelling: String,
    pub pronunciation: Option<String>,
}

/// One sense of a word, scoped to a specific dictionary
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeaningItem {
    pub id: String,
    pub word_id: String,
    pub dict_id: String,
    pub pos_tag: Option<String>,
    pub gloss: String,
}

/// An example sentence attached to a meaning item.
///
/// The audio lifecycle lives in `kind`: `tts` = audio present on disk,
/// `temp_sound` = generated remotely and awaiting download, `no_sound` =
/// needs regeneration.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sentence {
    pub id: String,
    pub meaning_item_id: String,
    pub source_text: String,
    pub target_text: Option<String>,
    pub digest: Option<String>,
    pub kind: String,
    pub producer: Option<String>,
    pub need_tts: bool,
    pub temp_sound_url: Option<String>,
}

/// Per-user position in a dictionary
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LearningProgress {
    pub user_id: String,
    pub dict_id: String,
    pub current_seq: i64,
}

/// A user's current client-sync database version
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDbVersion {
    pub user_id: String,
    pub version: i64,
}

/// One change-log row driving client sync
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChangeLogEntry {
    pub id: i64,
    pub user_id: String,
    pub version: i64,
    pub operation: String,
    pub table_name: String,
    pub record_id: Option<String>,
}
