use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single file queued for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    pub path: PathBuf,
}

impl AnalysisTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One issue reported by the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub line: u32,
    pub column: u32,
    pub message: String,
    /// `None` for fatal parse errors, which the engine reports without a rule.
    pub rule_id: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FileRead,
    Engine,
    TimedOut,
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::FileRead => write!(f, "read error"),
            FailureKind::Engine => write!(f, "engine error"),
            FailureKind::TimedOut => write!(f, "timed out"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Findings { findings: Vec<Finding> },
    Failed { failure: AnalysisFailure },
}

/// The outcome of analyzing one file, always attributed by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AnalysisResult {
    pub fn success(path: impl Into<PathBuf>, findings: Vec<Finding>) -> Self {
        Self {
            path: path.into(),
            outcome: Outcome::Findings { findings },
        }
    }

    pub fn failure(
        path: impl Into<PathBuf>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            outcome: Outcome::Failed {
                failure: AnalysisFailure {
                    kind,
                    message: message.into(),
                },
            },
        }
    }

    /// Findings of a successful analysis; empty for failures.
    pub fn findings(&self) -> &[Finding] {
        match &self.outcome {
            Outcome::Findings { findings } => findings,
            Outcome::Failed { .. } => &[],
        }
    }

    pub fn failure_info(&self) -> Option<&AnalysisFailure> {
        match &self.outcome {
            Outcome::Findings { .. } => None,
            Outcome::Failed { failure } => Some(failure),
        }
    }
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// One per analysis result, failed and cancelled files included.
    pub files_scanned: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub failed_files: usize,
    pub cancelled_files: usize,
}

impl RunSummary {
    /// Fold one result into the counters.
    pub fn record(&mut self, result: &AnalysisResult) {
        self.files_scanned += 1;
        match &result.outcome {
            Outcome::Findings { findings } => {
                for finding in findings {
                    match finding.severity {
                        Severity::Error => self.error_count += 1,
                        Severity::Warning => self.warning_count += 1,
                    }
                }
            }
            Outcome::Failed { failure } if failure.kind == FailureKind::Cancelled => {
                self.cancelled_files += 1;
            }
            Outcome::Failed { .. } => self.failed_files += 1,
        }
    }

    pub fn has_issues(&self) -> bool {
        self.error_count > 0 || self.warning_count > 0
    }

    pub fn is_clean(&self) -> bool {
        !self.has_issues() && self.failed_files == 0 && self.cancelled_files == 0
    }
}
