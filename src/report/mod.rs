//! Report renderers for analysis results.
//!
//! - [`terminal`] — severity-colored findings grouped by file, then a summary;
//!   respects `--quiet`.
//! - [`json`] — machine-readable results plus the summary.

use crate::models::{AnalysisResult, RunSummary};

pub mod json;
pub mod terminal;

/// Count findings and failures across all results.
pub fn summarize(results: &[AnalysisResult]) -> RunSummary {
    let mut summary = RunSummary::default();
    for result in results {
        summary.record(result);
    }
    summary
}

/// Results in path order, independent of completion order.
pub fn sorted(results: &[AnalysisResult]) -> Vec<&AnalysisResult> {
    let mut ordered: Vec<&AnalysisResult> = results.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));
    ordered
}
