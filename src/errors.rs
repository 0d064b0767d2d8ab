//! Batch-level errors. Per-file problems never surface here; they are carried
//! as [`AnalysisFailure`](crate::models::AnalysisFailure) values instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Please provide a directory path to analyze.")]
    MissingPath,

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("timeout must be at least 1 second")]
    ZeroTimeout,
}

#[derive(Debug, Error)]
pub enum DependencyInstallError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors raised by an [`Engine`](crate::engine::Engine) for a single file.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("unreadable engine output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Fatal errors that end a run before any report is printed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    DependencyInstall(#[from] DependencyInstallError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
