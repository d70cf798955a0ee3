//! Check-and-repair orchestration
//!
//! Runs the four checkers in a fixed order, prints the staged report, asks
//! for one confirmation, then applies repairs in dependency order:
//! per-dictionary units first, then the change-log batch, then the
//! progress batch. A failed unit is rolled back, counted, and skipped;
//! it never aborts the remaining units.

use crate::checks;
use crate::issue::Issue;
use crate::repair;
use crate::report::{self, CheckReport, DictFindings};
use lxb_common::Result;
use sqlx::SqlitePool;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

/// How the single repair confirmation is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairDecision {
    /// Ask on stdin (interactive runs)
    Prompt,
    /// Repair without asking (`--yes`)
    Always,
    /// Never repair (`--report-only`)
    Never,
}

#[derive(Debug, Clone)]
pub struct CheckerOptions {
    /// Owner id marking system-curated dictionaries
    pub system_owner_id: String,
    /// Reserved id of the universal dictionary
    pub universal_dict_id: String,
    pub decision: RepairDecision,
    /// Optional path for a JSON export of the full report
    pub json_export: Option<PathBuf>,
}

/// Outcome of a full run, mapped to the process exit code by main
#[derive(Debug)]
pub enum RunOutcome {
    /// No issues found
    Clean,
    /// Repairs were applied (possibly with failed units, which are non-fatal)
    Repaired(RepairSummary),
    /// Issues found but the operator declined repair
    Declined,
}

/// Counts from one repair pass
#[derive(Debug, Default)]
pub struct RepairSummary {
    pub dict_units_repaired: usize,
    pub dict_units_failed: usize,
    pub dicts_deleted: usize,
    pub seq_rows_rewritten: u64,
    pub counts_corrected: usize,
    pub log_rows_deleted: u64,
    pub log_batch_failed: bool,
    pub progress_rows_clamped: u64,
    pub progress_batch_failed: bool,
}

impl RepairSummary {
    pub fn failed_units(&self) -> usize {
        self.dict_units_failed
            + usize::from(self.log_batch_failed)
            + usize::from(self.progress_batch_failed)
    }
}

/// Run all four check stages and print the staged report
pub async fn run_checks(pool: &SqlitePool, opts: &CheckerOptions) -> Result<CheckReport> {
    report::print_stage_header(1, "Membership order & count");
    let dicts = checks::load_checked_dictionaries(pool).await?;
    println!("\nChecking {} dictionaries...", dicts.len());

    let total_dicts = dicts.len();
    let mut invalid_dicts = Vec::new();
    for dict in &dicts {
        let issues = checks::check_dictionary(pool, dict, &opts.system_owner_id).await?;
        if !issues.is_empty() {
            let owner_name =
                checks::resolve_owner_name(pool, &dict.owner_id, &opts.system_owner_id).await?;
            let findings = DictFindings {
                dict: dict.clone(),
                owner_name,
                issues,
            };
            report::print_dictionary_findings(&findings);
            invalid_dicts.push(findings);
        }
    }
    report::print_membership_summary(total_dicts, invalid_dicts.len());

    report::print_stage_header(2, "Change-log versions");
    let version_issues = checks::check_change_log_versions(pool).await?;
    report::print_version_issues(&version_issues);

    report::print_stage_header(3, "Learning progress");
    let progress_issues = checks::check_learning_progress(pool).await?;
    report::print_progress_issues(&progress_issues);

    report::print_stage_header(4, "Universal-dictionary completeness");
    let completeness_issues =
        checks::check_universal_dictionary(pool, &opts.universal_dict_id).await?;
    report::print_completeness_issues(&completeness_issues);

    let check_report = CheckReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_dicts,
        invalid_dicts,
        version_issues,
        progress_issues,
        completeness_issues,
    };

    report::print_aggregate(&check_report);

    if let Some(path) = &opts.json_export {
        check_report.export_json(path)?;
        info!("Report exported to {}", path.display());
    }

    Ok(check_report)
}

/// Apply every repair the report calls for. Unit failures are logged and
/// counted, never propagated.
pub async fn apply_repairs(pool: &SqlitePool, check_report: &CheckReport) -> RepairSummary {
    let mut summary = RepairSummary::default();

    for findings in &check_report.invalid_dicts {
        let dict_id = &findings.dict.id;

        let delete = findings
            .issues
            .iter()
            .any(|i| matches!(i, Issue::EmptySystemDict { .. }));

        if delete {
            match repair::delete_empty_system_dictionary(pool, dict_id).await {
                Ok(counts) => {
                    summary.dict_units_repaired += 1;
                    summary.dicts_deleted += 1;
                    println!(
                        "  deleted dictionary '{}' ({} sentences, {} meanings, {} progress rows, {} memberships)",
                        findings.dict.name,
                        counts.sentences,
                        counts.meaning_items,
                        counts.progress_rows,
                        counts.memberships
                    );
                }
                Err(e) => {
                    error!(%dict_id, error = %e, "Dictionary delete failed, rolled back");
                    summary.dict_units_failed += 1;
                }
            }
            continue;
        }

        let set_count = findings.issues.iter().find_map(|i| match i {
            Issue::WordCountMismatch { actual_count, .. } => Some(*actual_count),
            _ => None,
        });

        match repair::normalize_dictionary(pool, dict_id, set_count).await {
            Ok(rewritten) => {
                summary.dict_units_repaired += 1;
                summary.seq_rows_rewritten += rewritten;
                if set_count.is_some() {
                    summary.counts_corrected += 1;
                }
                println!(
                    "  repaired dictionary '{}' ({} sequence numbers rewritten{})",
                    findings.dict.name,
                    rewritten,
                    if set_count.is_some() {
                        ", word count corrected"
                    } else {
                        ""
                    }
                );
            }
            Err(e) => {
                error!(%dict_id, error = %e, "Dictionary repair failed, rolled back");
                summary.dict_units_failed += 1;
            }
        }
    }

    if !check_report.version_issues.is_empty() {
        match repair::delete_invalid_log_rows(pool, &check_report.version_issues).await {
            Ok(deleted) => {
                summary.log_rows_deleted = deleted;
                println!("  deleted {} invalid change-log rows", deleted);
            }
            Err(e) => {
                error!(error = %e, "Change-log repair failed, rolled back");
                summary.log_batch_failed = true;
            }
        }
    }

    if !check_report.progress_issues.is_empty() {
        match repair::clamp_learning_progress(pool, &check_report.progress_issues).await {
            Ok(clamped) => {
                summary.progress_rows_clamped = clamped;
                println!("  clamped {} learning-progress rows", clamped);
            }
            Err(e) => {
                error!(error = %e, "Learning-progress repair failed, rolled back");
                summary.progress_batch_failed = true;
            }
        }
    }

    summary
}

/// Full run: check, report, confirm, repair
pub async fn run(pool: &SqlitePool, opts: &CheckerOptions) -> Result<RunOutcome> {
    let check_report = run_checks(pool, opts).await?;

    if !check_report.has_issues() {
        println!("\nAll checks passed.");
        return Ok(RunOutcome::Clean);
    }

    if !confirm_repair(opts.decision) {
        println!("\nRepairs skipped.");
        return Ok(RunOutcome::Declined);
    }

    println!("\nApplying repairs...");
    let summary = apply_repairs(pool, &check_report).await;

    println!(
        "\nRepair complete: {} dictionary units repaired, {} failed",
        summary.dict_units_repaired, summary.dict_units_failed
    );
    if summary.dicts_deleted > 0 {
        println!("  empty dictionaries deleted: {}", summary.dicts_deleted);
    }
    if summary.log_rows_deleted > 0 || summary.log_batch_failed {
        println!(
            "  change-log rows deleted: {}{}",
            summary.log_rows_deleted,
            if summary.log_batch_failed {
                " (batch failed)"
            } else {
                ""
            }
        );
    }
    if summary.progress_rows_clamped > 0 || summary.progress_batch_failed {
        println!(
            "  progress rows clamped: {}{}",
            summary.progress_rows_clamped,
            if summary.progress_batch_failed {
                " (batch failed)"
            } else {
                ""
            }
        );
    }

    Ok(RunOutcome::Repaired(summary))
}

fn confirm_repair(decision: RepairDecision) -> bool {
    match decision {
        RepairDecision::Always => true,
        RepairDecision::Never => false,
        RepairDecision::Prompt => prompt_yes_no(),
    }
}

fn prompt_yes_no() -> bool {
    print!("\nApply repairs? [y/N]: ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
