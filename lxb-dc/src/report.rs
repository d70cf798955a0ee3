//! Report generation and formatting
//!
//! The staged operator report is the product of a check run, so it goes to
//! stdout via `println!` rather than the tracing layer. Sections appear in
//! check order: per-dictionary anomalies, change-log versions, learning
//! progress, universal-dictionary completeness, then the aggregate summary.

use crate::issue::Issue;
use lxb_common::db::models::Dictionary;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Detail lines shown for completeness issues before eliding the rest
const COMPLETENESS_DETAIL_CAP: usize = 10;

/// One dictionary's check result with everything needed to report it
#[derive(Debug, Clone, Serialize)]
pub struct DictFindings {
    pub dict: Dictionary,
    pub owner_name: String,
    pub issues: Vec<Issue>,
}

/// Full result of one check run across all four stages
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Run timestamp (ISO 8601)
    pub generated_at: String,
    pub total_dicts: usize,
    pub invalid_dicts: Vec<DictFindings>,
    pub version_issues: Vec<Issue>,
    pub progress_issues: Vec<Issue>,
    pub completeness_issues: Vec<Issue>,
}

impl CheckReport {
    pub fn valid_dicts(&self) -> usize {
        self.total_dicts - self.invalid_dicts.len()
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }

    pub fn issue_count(&self) -> usize {
        self.invalid_dicts
            .iter()
            .map(|f| f.issues.len())
            .sum::<usize>()
            + self.version_issues.len()
            + self.progress_issues.len()
            + self.completeness_issues.len()
    }

    /// Export the full report (all stages, all issues) as pretty JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

pub fn print_stage_header(stage: usize, title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Stage {}: {}", stage, title);
    println!("{}", "=".repeat(60));
}

/// Print one invalid dictionary with every issue found in it
pub fn print_dictionary_findings(findings: &DictFindings) {
    println!(
        "\nDictionary: {} (id {}, owner {})",
        findings.dict.name, findings.dict.id, findings.owner_name
    );

    for issue in &findings.issues {
        match issue {
            Issue::EmptySystemDict { declared_count, .. } => {
                println!(
                    "  [✗] empty system dictionary (declared word count {}); repair deletes it",
                    declared_count
                );
            }
            Issue::WordCountMismatch {
                declared_count,
                actual_count,
                ..
            } => {
                println!(
                    "  [✗] word count mismatch: declared {}, actual {}",
                    declared_count, actual_count
                );
            }
            Issue::NotStartFromOne {
                spelling,
                word_id,
                actual,
                ..
            } => {
                println!(
                    "  [✗] first sequence number is {} (word '{}', id {}); expected 1",
                    actual, spelling, word_id
                );
            }
            Issue::Discontinuous {
                position,
                spelling,
                word_id,
                expected,
                actual,
                ..
            } => {
                println!(
                    "  [✗] position {}: word '{}' (id {}) expected seq {}, actual {}",
                    position, spelling, word_id, expected, actual
                );
            }
            Issue::MaxIndexError {
                expected, actual, ..
            } => {
                println!(
                    "  [✗] max sequence number is {}, membership count is {}",
                    actual, expected
                );
            }
            // Other kinds never appear in a per-dictionary findings list
            other => println!("  [✗] {}", other.kind()),
        }
    }
}

pub fn print_membership_summary(total: usize, invalid: usize) {
    let valid = total - invalid;
    println!("\nDictionaries checked: {}", total);
    println!("  [✓] valid:   {}", valid);
    println!("  [✗] invalid: {}", invalid);
    if total > 0 {
        println!(
            "  pass rate: {:.1}%",
            valid as f64 / total as f64 * 100.0
        );
    }
}

pub fn print_version_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("\n[✓] all change-log versions within user versions");
        return;
    }

    println!("\n[✗] {} change-log rows exceed their user's version:", issues.len());
    for issue in issues {
        if let Issue::VersionExceedsCurrent {
            username,
            user_id,
            log_id,
            log_version,
            current_version,
            operation,
            table_name,
            record_id,
            created_at,
        } = issue
        {
            println!(
                "  user {} (id {}, current version {}): log {} has version {}",
                username, user_id, current_version, log_id, log_version
            );
            println!(
                "    {} on {}, record {}, created {}",
                operation,
                table_name,
                record_id.as_deref().unwrap_or("-"),
                created_at
            );
        }
    }

    let affected_users: HashSet<&str> = issues
        .iter()
        .filter_map(|i| match i {
            Issue::VersionExceedsCurrent { user_id, .. } => Some(user_id.as_str()),
            _ => None,
        })
        .collect();
    println!("  affected users: {}", affected_users.len());
}

pub fn print_progress_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("\n[✓] all learning progress within dictionary bounds");
        return;
    }

    println!("\n[✗] {} learning-progress rows exceed their dictionary:", issues.len());
    for issue in issues {
        if let Issue::LearningProgressExceeds {
            username,
            dict_name,
            current_seq,
            word_count,
            ..
        } = issue
        {
            println!(
                "  user {}: dictionary '{}' progress {} > word count {}",
                username, dict_name, current_seq, word_count
            );
        }
    }
}

pub fn print_completeness_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("\n[✓] universal dictionary complete (meanings and sentences present)");
        return;
    }

    let no_meaning = issues
        .iter()
        .filter(|i| matches!(i, Issue::NoMeaning { .. }))
        .count();
    let no_sentence = issues.len() - no_meaning;
    let affected_words: HashSet<&str> = issues
        .iter()
        .filter_map(|i| match i {
            Issue::NoMeaning { word_id, .. } => Some(word_id.as_str()),
            Issue::MeaningWithoutSentence { word_id, .. } => Some(word_id.as_str()),
            _ => None,
        })
        .collect();

    println!("\n[✗] universal dictionary incomplete (informational, no repair):");
    println!("  affected words: {}", affected_words.len());
    if no_meaning > 0 {
        println!("  words without meanings: {}", no_meaning);
    }
    if no_sentence > 0 {
        println!("  meanings without sentences: {}", no_sentence);
    }

    for issue in issues.iter().take(COMPLETENESS_DETAIL_CAP) {
        match issue {
            Issue::NoMeaning { spelling, .. } => {
                println!("  - '{}': no meaning items", spelling);
            }
            Issue::MeaningWithoutSentence {
                spelling,
                gloss_preview,
                ..
            } => {
                println!("  - '{}': meaning without sentence: \"{}\"", spelling, gloss_preview);
            }
            _ => {}
        }
    }
    if issues.len() > COMPLETENESS_DETAIL_CAP {
        println!("  ... and {} more", issues.len() - COMPLETENESS_DETAIL_CAP);
    }
}

/// Aggregate summary across all four stages
pub fn print_aggregate(report: &CheckReport) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Summary");
    println!("{}", "=".repeat(60));

    println!(
        "  dictionaries:        {}/{} valid",
        report.valid_dicts(),
        report.total_dicts
    );
    print_pass_fail("change-log versions", report.version_issues.len());
    print_pass_fail("learning progress", report.progress_issues.len());
    print_pass_fail("completeness", report.completeness_issues.len());
    println!("  total issues:        {}", report.issue_count());
}

fn print_pass_fail(label: &str, issue_count: usize) {
    if issue_count == 0 {
        println!("  {:<20} [✓]", format!("{}:", label));
    } else {
        println!("  {:<20} [✗] {} issues", format!("{}:", label), issue_count);
    }
}
