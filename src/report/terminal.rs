use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{AnalysisFailure, AnalysisResult, FailureKind, Finding, RunSummary, Severity};

/// Print the colored report to stdout and return the run summary.
pub fn render(results: &[AnalysisResult], quiet: bool) -> RunSummary {
    let (text, summary) = format_report(results, quiet);
    print!("{}", text);
    summary
}

/// Build the whole report: findings grouped by file, then the summary.
///
/// Files without findings are omitted; failed files are listed with their
/// failure. In quiet mode only the one-line summary is produced.
pub fn format_report(results: &[AnalysisResult], quiet: bool) -> (String, RunSummary) {
    let summary = super::summarize(results);

    if quiet {
        return (format!("{}\n", format_quiet_line(&summary)), summary);
    }

    let mut out = String::new();
    for result in super::sorted(results) {
        if let Some(failure) = result.failure_info() {
            if failure.kind == FailureKind::Cancelled {
                continue;
            }
            out.push_str(&format_file_header(&result.path));
            out.push('\n');
            out.push_str(&format_failure(failure));
            out.push('\n');
            continue;
        }

        let findings = result.findings();
        if findings.is_empty() {
            continue;
        }
        out.push_str(&format_file_header(&result.path));
        out.push('\n');
        for finding in findings {
            out.push_str(&format_finding(finding));
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&format_summary(&summary));
    out.push('\n');
    (out, summary)
}

pub fn format_file_header(path: &Path) -> String {
    format!("\nFile: {}", path.display()).green().bold().to_string()
}

pub fn format_finding(finding: &Finding) -> String {
    let line = format!(
        "  {} Line {}: {} (Rule: {})",
        severity_icon(finding.severity),
        finding.line,
        finding.message,
        finding.rule_id.as_deref().unwrap_or("none"),
    );
    match finding.severity {
        Severity::Error => line.red().to_string(),
        Severity::Warning => line.yellow().to_string(),
    }
}

pub fn format_failure(failure: &AnalysisFailure) -> String {
    format!("  ✖ Could not analyze ({}): {}", failure.kind, failure.message)
        .red()
        .to_string()
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✖",
        Severity::Warning => "⚠",
    }
}

/// Summary table, or the "no issues" line for a clean run.
pub fn format_summary(summary: &RunSummary) -> String {
    if summary.is_clean() {
        return format!(
            "{} No issues found in {} file(s). 🎉",
            "✓".green(),
            summary.files_scanned
        )
        .green()
        .to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Analysis Summary").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);

    let mut row = |label: &str, count: usize, color: Option<Color>| {
        let mut cell = Cell::new(count).set_alignment(CellAlignment::Right);
        if let Some(color) = color.filter(|_| count > 0) {
            cell = cell.fg(color);
        }
        table.add_row(vec![Cell::new(label), cell]);
    };

    row("Files scanned", summary.files_scanned, None);
    row("Errors found", summary.error_count, Some(Color::Red));
    row("Warnings found", summary.warning_count, Some(Color::Yellow));
    if summary.failed_files > 0 {
        row("Files not analyzed", summary.failed_files, Some(Color::Red));
    }
    if summary.cancelled_files > 0 {
        row("Skipped after interrupt", summary.cancelled_files, Some(Color::DarkGrey));
    }

    table.to_string()
}

pub fn format_quiet_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "Files: {}  Errors: {}  Warnings: {}",
        summary.files_scanned,
        summary.error_count.to_string().red(),
        summary.warning_count.to_string().yellow(),
    );
    if summary.failed_files > 0 {
        line.push_str(&format!("  Failed: {}", summary.failed_files.to_string().red()));
    }
    if summary.cancelled_files > 0 {
        line.push_str(&format!("  Cancelled: {}", summary.cancelled_files));
    }
    line
}

// Status lines printed around the report (stderr).

pub fn info(message: &str) -> String {
    format!("  {} {}", "→".cyan(), message)
}

pub fn warn(message: &str) -> String {
    format!("  {} {}", "⚠".yellow(), message).yellow().to_string()
}

pub fn heading(message: &str) -> String {
    format!(" {} ", message).bold().white().on_blue().to_string()
}
