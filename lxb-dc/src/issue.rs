//! Issue classification
//!
//! A closed set of anomaly kinds. Each variant carries exactly the fields
//! its report line and its repair action need, so repair never has to
//! re-query what validation already saw.

use serde::{Deserialize, Serialize};

/// One detected consistency anomaly
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A system-curated dictionary with zero memberships. Repair deletes the
    /// dictionary and all dependent rows.
    EmptySystemDict {
        dict_id: String,
        dict_name: String,
        owner_id: String,
        declared_count: i64,
    },

    /// Declared word count differs from the actual membership count. Repair
    /// sets the declared count to the actual count.
    WordCountMismatch {
        dict_id: String,
        dict_name: String,
        declared_count: i64,
        actual_count: i64,
    },

    /// The first sequence number of a dictionary is not 1
    NotStartFromOne {
        dict_id: String,
        position: i64,
        word_id: String,
        spelling: String,
        expected: i64,
        actual: i64,
    },

    /// A membership row whose sequence number breaks the contiguous run.
    /// One issue per offending row.
    Discontinuous {
        dict_id: String,
        position: i64,
        word_id: String,
        spelling: String,
        expected: i64,
        actual: i64,
    },

    /// The highest sequence number differs from the membership count
    MaxIndexError {
        dict_id: String,
        position: i64,
        word_id: String,
        spelling: String,
        expected: i64,
        actual: i64,
    },

    /// A change-log row referencing a version beyond the user's current
    /// database version. Repair deletes the row.
    VersionExceedsCurrent {
        user_id: String,
        username: String,
        log_id: i64,
        log_version: i64,
        current_version: i64,
        operation: String,
        table_name: String,
        record_id: Option<String>,
        created_at: String,
    },

    /// A learning-progress position beyond the dictionary's word count.
    /// Repair clamps the position to the word count.
    LearningProgressExceeds {
        user_id: String,
        username: String,
        dict_id: String,
        dict_name: String,
        current_seq: i64,
        word_count: i64,
    },

    /// A universal-dictionary word with no meaning items (informational)
    NoMeaning {
        dict_id: String,
        word_id: String,
        spelling: String,
    },

    /// A meaning item with no example sentences (informational)
    MeaningWithoutSentence {
        dict_id: String,
        word_id: String,
        spelling: String,
        meaning_id: String,
        gloss_preview: String,
    },
}

impl Issue {
    /// Stable label for report lines and JSON export
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::EmptySystemDict { .. } => "empty_system_dict",
            Issue::WordCountMismatch { .. } => "word_count_mismatch",
            Issue::NotStartFromOne { .. } => "not_start_from_one",
            Issue::Discontinuous { .. } => "discontinuous",
            Issue::MaxIndexError { .. } => "max_index_error",
            Issue::VersionExceedsCurrent { .. } => "version_exceeds_current",
            Issue::LearningProgressExceeds { .. } => "learning_progress_exceeds",
            Issue::NoMeaning { .. } => "no_meaning",
            Issue::MeaningWithoutSentence { .. } => "meaning_without_sentence",
        }
    }

    /// Issues with no repair action; reported but never written back
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Issue::NoMeaning { .. } | Issue::MeaningWithoutSentence { .. }
        )
    }

    /// True for the membership-ordering kinds whose repair is a resequence
    pub fn is_order_issue(&self) -> bool {
        matches!(
            self,
            Issue::NotStartFromOne { .. }
                | Issue::Discontinuous { .. }
                | Issue::MaxIndexError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        let issue = Issue::Discontinuous {
            dict_id: "d1".into(),
            position: 3,
            word_id: "w9".into(),
            spelling: "abandon".into(),
            expected: 3,
            actual: 4,
        };
        assert_eq!(issue.kind(), "discontinuous");
        assert!(issue.is_order_issue());
        assert!(!issue.is_informational());
    }

    #[test]
    fn json_export_is_tagged_by_kind() {
        let issue = Issue::NoMeaning {
            dict_id: "0".into(),
            word_id: "w1".into(),
            spelling: "apple".into(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "no_meaning");
        assert!(issue.is_informational());
    }
}
