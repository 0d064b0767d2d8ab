//! Bounded fan-out of per-file analyses.
//!
//! At most `concurrency` files are read and linted at once; a new task starts
//! as soon as any in-flight one settles. Every task yields exactly one
//! [`AnalysisResult`], success or failure, so a bad file never hides the rest
//! of the batch.

use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::engine::Engine;
use crate::models::{AnalysisResult, AnalysisTask, FailureKind, Finding};

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub concurrency: usize,
    /// Upper bound for reading plus linting a single file.
    pub timeout: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

/// How far a run has been asked to wind down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopSignal {
    #[default]
    Run,
    /// No new files start; in-flight analyses finish.
    Drain,
    /// In-flight analyses are abandoned as well.
    Abort,
}

/// Analyze every task and collect the results in completion order.
///
/// Once `stop` reads [`StopSignal::Drain`], tasks that have not started are
/// reported as [`FailureKind::Cancelled`] and in-flight analyses run to
/// completion. [`StopSignal::Abort`] also drops in-flight analyses, which are
/// reported as cancelled. `on_complete` is invoked once per result as it
/// arrives.
pub async fn run_analysis<F>(
    tasks: Vec<AnalysisTask>,
    options: &DispatchOptions,
    engine: &dyn Engine,
    stop: watch::Receiver<StopSignal>,
    mut on_complete: F,
) -> Vec<AnalysisResult>
where
    F: FnMut(&AnalysisResult),
{
    let limit = options.concurrency.max(1);
    let timeout = options.timeout;
    let mut results = Vec::with_capacity(tasks.len());

    let mut pending = stream::iter(tasks)
        .map(|task| {
            let mut stop = stop.clone();
            async move {
                if *stop.borrow() != StopSignal::Run {
                    return AnalysisResult::failure(
                        task.path,
                        FailureKind::Cancelled,
                        "run interrupted before this file was analyzed",
                    );
                }
                let path = task.path.clone();
                tokio::select! {
                    result = analyze_task(task, engine, timeout) => result,
                    _ = aborted(&mut stop) => {
                        tracing::debug!(path = %path.display(), "abandoned in-flight analysis");
                        AnalysisResult::failure(
                            path,
                            FailureKind::Cancelled,
                            "run aborted while this file was being analyzed",
                        )
                    }
                }
            }
        })
        .buffer_unordered(limit);

    while let Some(result) = pending.next().await {
        on_complete(&result);
        results.push(result);
    }

    results
}

/// Resolves once `stop` reaches [`StopSignal::Abort`]; never if the sender
/// goes away first.
async fn aborted(stop: &mut watch::Receiver<StopSignal>) {
    let reached = stop.wait_for(|s| *s == StopSignal::Abort).await.is_ok();
    if !reached {
        std::future::pending::<()>().await;
    }
}

async fn analyze_task(
    task: AnalysisTask,
    engine: &dyn Engine,
    timeout: Duration,
) -> AnalysisResult {
    let AnalysisTask { path } = task;

    let outcome = tokio::time::timeout(timeout, analyze_file(&path, engine)).await;
    match outcome {
        Ok(result) => match result {
            Ok(findings) => {
                tracing::trace!(path = %path.display(), count = findings.len(), "analyzed");
                AnalysisResult::success(path, findings)
            }
            Err((kind, message)) => {
                tracing::debug!(path = %path.display(), %kind, %message, "analysis failed");
                AnalysisResult::failure(path, kind, message)
            }
        },
        Err(_) => {
            tracing::debug!(path = %path.display(), ?timeout, "analysis timed out");
            AnalysisResult::failure(
                path,
                FailureKind::TimedOut,
                format!("analysis did not finish within {}s", timeout.as_secs_f32()),
            )
        }
    }
}

async fn analyze_file(
    path: &Path,
    engine: &dyn Engine,
) -> Result<Vec<Finding>, (FailureKind, String)> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| (FailureKind::FileRead, e.to_string()))?;

    engine
        .analyze(path, &content)
        .await
        .map_err(|e| (FailureKind::Engine, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::models::{Outcome, Severity};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records peak concurrency and fails on files whose content says so.
    #[derive(Default)]
    struct StubEngine {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        delay_ms: u64,
        /// Sent on every call, to interrupt a run from inside the engine.
        on_call: Mutex<Option<(watch::Sender<StopSignal>, StopSignal)>>,
    }

    #[async_trait]
    impl Engine for StubEngine {
        async fn analyze(&self, _path: &Path, content: &str) -> Result<Vec<Finding>, EngineError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            {
                let guard = self.on_call.lock().unwrap();
                if let Some((tx, signal)) = guard.as_ref() {
                    let _ = tx.send(*signal);
                }
            }

            let delay = if content.contains("slow") { 2_000 } else { self.delay_ms };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if content.contains("boom") {
                return Err(EngineError::Other("parser crashed".to_string()));
            }
            Ok(vec![Finding {
                line: 1,
                column: 1,
                message: "Unexpected var, use let or const instead.".to_string(),
                rule_id: Some("no-var".to_string()),
                severity: Severity::Error,
            }])
        }
    }

    fn write_files(dir: &TempDir, files: &[(&str, &str)]) -> Vec<AnalysisTask> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                std::fs::write(&path, content).unwrap();
                AnalysisTask::new(path)
            })
            .collect()
    }

    fn not_cancelled() -> watch::Receiver<StopSignal> {
        watch::channel(StopSignal::Run).1
    }

    #[tokio::test]
    async fn test_never_exceeds_concurrency() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..12).map(|i| format!("f{i}.js")).collect();
        let files: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "var x = 1;")).collect();
        let tasks = write_files(&dir, &files);

        let engine = StubEngine {
            delay_ms: 20,
            ..Default::default()
        };
        let options = DispatchOptions {
            concurrency: 3,
            timeout: Duration::from_secs(5),
        };
        let results = run_analysis(tasks, &options, &engine, not_cancelled(), |_| {}).await;

        assert_eq!(results.len(), 12);
        assert!(engine.peak.load(Ordering::SeqCst) <= 3);
        assert!(engine.peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("a.js", "var a;"), ("bad.js", "boom"), ("c.js", "var c;")]);

        let engine = StubEngine::default();
        let results =
            run_analysis(tasks, &DispatchOptions::default(), &engine, not_cancelled(), |_| {}).await;

        assert_eq!(results.len(), 3);
        let bad = results.iter().find(|r| r.path.ends_with("bad.js")).unwrap();
        let failure = bad.failure_info().unwrap();
        assert_eq!(failure.kind, FailureKind::Engine);
        assert!(failure.message.contains("parser crashed"));
        for ok in results.iter().filter(|r| !r.path.ends_with("bad.js")) {
            assert_eq!(ok.findings().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let mut tasks = write_files(&dir, &[("a.js", "var a;")]);
        tasks.push(AnalysisTask::new(dir.path().join("vanished.js")));

        let engine = StubEngine::default();
        let results =
            run_analysis(tasks, &DispatchOptions::default(), &engine, not_cancelled(), |_| {}).await;

        let vanished = results.iter().find(|r| r.path.ends_with("vanished.js")).unwrap();
        assert_eq!(vanished.failure_info().unwrap().kind, FailureKind::FileRead);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_marks_only_slow_file() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("fast.js", "var a;"), ("slow.js", "slow")]);

        let engine = StubEngine::default();
        let options = DispatchOptions {
            concurrency: 2,
            timeout: Duration::from_millis(200),
        };
        let results = run_analysis(tasks, &options, &engine, not_cancelled(), |_| {}).await;

        let slow = results.iter().find(|r| r.path.ends_with("slow.js")).unwrap();
        assert_eq!(slow.failure_info().unwrap().kind, FailureKind::TimedOut);
        let fast = results.iter().find(|r| r.path.ends_with("fast.js")).unwrap();
        assert!(matches!(fast.outcome, Outcome::Findings { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("a.js", "var a;"), ("b.js", "var b;")]);
        let (tx, rx) = watch::channel(StopSignal::Drain);

        let engine = StubEngine::default();
        let results = run_analysis(tasks, &DispatchOptions::default(), &engine, rx, |_| {}).await;
        drop(tx);

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.failure_info().map(|f| f.kind) == Some(FailureKind::Cancelled)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_lets_in_flight_finish() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("a.js", "var a;"), ("b.js", "var b;"), ("c.js", "var c;")]);
        let (tx, rx) = watch::channel(StopSignal::Run);

        let engine = StubEngine {
            on_call: Mutex::new(Some((tx, StopSignal::Drain))),
            ..Default::default()
        };
        let options = DispatchOptions {
            concurrency: 1,
            timeout: Duration::from_secs(5),
        };
        let results = run_analysis(tasks, &options, &engine, rx, |_| {}).await;

        assert_eq!(results.len(), 3);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        let finished: Vec<&PathBuf> = results
            .iter()
            .filter(|r| r.failure_info().is_none())
            .map(|r| &r.path)
            .collect();
        assert_eq!(finished.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_abandons_in_flight_analysis() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("a.js", "slow"), ("b.js", "var b;")]);
        let (tx, rx) = watch::channel(StopSignal::Run);

        let engine = StubEngine {
            on_call: Mutex::new(Some((tx, StopSignal::Abort))),
            ..Default::default()
        };
        let options = DispatchOptions {
            concurrency: 1,
            timeout: Duration::from_secs(10),
        };
        let started = std::time::Instant::now();
        let results = run_analysis(tasks, &options, &engine, rx, |_| {}).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.failure_info().map(|f| f.kind) == Some(FailureKind::Cancelled)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_stop_sender_does_not_cancel() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("a.js", "var a;")]);

        let engine = StubEngine {
            delay_ms: 50,
            ..Default::default()
        };
        let results =
            run_analysis(tasks, &DispatchOptions::default(), &engine, not_cancelled(), |_| {}).await;

        assert_eq!(results[0].findings().len(), 1);
    }

    #[tokio::test]
    async fn test_progress_callback_once_per_result() {
        let dir = TempDir::new().unwrap();
        let tasks = write_files(&dir, &[("a.js", "var a;"), ("b.js", "boom")]);
        let mut seen = Vec::new();

        let engine = StubEngine::default();
        run_analysis(tasks, &DispatchOptions::default(), &engine, not_cancelled(), |r| {
            seen.push(r.path.clone())
        })
        .await;

        seen.sort();
        assert_eq!(seen, vec![dir.path().join("a.js"), dir.path().join("b.js")]);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let engine = StubEngine::default();
        let results =
            run_analysis(Vec::new(), &DispatchOptions::default(), &engine, not_cancelled(), |_| {})
                .await;
        assert!(results.is_empty());
    }
}
