use anyhow::Result;
use serde::Serialize;

use crate::models::{AnalysisResult, RunSummary};

#[derive(Serialize)]
struct JsonReport<'a> {
    results: Vec<&'a AnalysisResult>,
    summary: RunSummary,
}

/// Pretty-printed JSON document with every result (path order) and the summary.
pub fn format_report(results: &[AnalysisResult]) -> Result<(String, RunSummary)> {
    let summary = super::summarize(results);
    let report = JsonReport {
        results: super::sorted(results),
        summary,
    };
    Ok((serde_json::to_string_pretty(&report)?, summary))
}
