//! One batch run: bootstrap, discover, dispatch.
//!
//! Reporting is left to the caller so the same results can be rendered as
//! terminal output or JSON.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

use crate::bootstrap::{ensure_dependencies, PackageEnvironment};
use crate::discovery::discover;
use crate::dispatcher::{run_analysis, DispatchOptions, StopSignal};
use crate::engine::Engine;
use crate::errors::RunError;
use crate::models::{AnalysisResult, AnalysisTask};
use crate::report::terminal;

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub root: PathBuf,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub packages: Vec<String>,
    pub dispatch: DispatchOptions,
    /// Suppress status lines and the progress bar.
    pub quiet: bool,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Discovery matched nothing; the engine was never invoked.
    NoFilesFound,
    Completed(Vec<AnalysisResult>),
}

/// Execute the run up to (not including) reporting.
///
/// `env` is `None` when dependency checks are skipped.
pub async fn execute(
    plan: &RunPlan,
    env: Option<&dyn PackageEnvironment>,
    engine: &dyn Engine,
    stop: watch::Receiver<StopSignal>,
) -> Result<RunOutcome, RunError> {
    if let Some(env) = env {
        ensure_dependencies(env, &plan.packages, plan.quiet).await?;
    }

    let files = discover(&plan.root, &plan.extensions, &plan.exclude)?;
    if files.is_empty() {
        return Ok(RunOutcome::NoFilesFound);
    }

    if !plan.quiet {
        eprintln!(
            "\n{}\n",
            terminal::heading(&format!(
                "Found {} file(s). Starting analysis...",
                files.len()
            ))
        );
    }

    let tasks: Vec<AnalysisTask> = files.into_iter().map(AnalysisTask::new).collect();
    let pb = progress_bar(tasks.len(), plan.quiet);

    let results = run_analysis(tasks, &plan.dispatch, engine, stop, |result| {
        if let Some(pb) = &pb {
            pb.set_message(result.path.display().to_string());
            pb.inc(1);
        }
    })
    .await;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    if !plan.quiet {
        eprintln!("{}", terminal::info("Code analysis completed!"));
    }

    Ok(RunOutcome::Completed(results))
}

fn progress_bar(len: usize, quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    Some(pb)
}
