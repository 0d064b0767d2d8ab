//! ESLint adapter: one `eslint --stdin` process per file, JSON output parsed
//! into findings.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::EngineSettings;
use crate::errors::EngineError;
use crate::models::{Finding, Severity};

use super::{rules, Engine};

/// Runs ESLint once per file, feeding the source on stdin.
pub struct EslintEngine {
    program: String,
    args: Vec<String>,
    env_root: PathBuf,
    /// Generated eslintrc; removed when the engine is dropped.
    config_file: NamedTempFile,
}

impl EslintEngine {
    pub fn new(settings: &EngineSettings) -> Result<Self> {
        let mut config_file = tempfile::Builder::new()
            .prefix("code-analyze-")
            .suffix(".json")
            .tempfile()
            .context("Failed to create ESLint config file")?;
        serde_json::to_writer_pretty(config_file.as_file_mut(), &rules::base_config())?;
        config_file.as_file_mut().flush()?;

        Ok(Self {
            program: settings.program.clone(),
            args: settings.args.clone(),
            env_root: settings.env_root.clone(),
            config_file,
        })
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--no-eslintrc")
            .arg("--config")
            .arg(self.config_file.path())
            .arg("--resolve-plugins-relative-to")
            .arg(&self.env_root)
            .args(["--format", "json", "--stdin", "--stdin-filename"])
            .arg(path)
            .current_dir(&self.env_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // A group of its own keeps terminal Ctrl-C away from in-flight lints
        // and lets a timeout kill whatever the launcher started.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

/// Kills a child's whole process group if dropped while still armed.
///
/// `kill_on_drop` only reaches the direct child (`npx`), not the `eslint`
/// process it spawned.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    /// The child was reaped normally; its group id may be reused from here on.
    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid.and_then(|p| libc::pid_t::try_from(p).ok()) {
            // SAFETY: killpg has no memory-safety preconditions; the group was
            // created for this child and its leader has not been reaped yet.
            let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
            if rc == 0 {
                tracing::debug!(pgid, "killed engine process group");
            }
        }
    }
}

#[async_trait]
impl Engine for EslintEngine {
    async fn analyze(&self, path: &Path, content: &str) -> Result<Vec<Finding>, EngineError> {
        let mut child = self.command(path).spawn().map_err(|source| EngineError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let guard = GroupGuard::new(child.id());

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Other("engine stdin unavailable".to_string()))?;

        let feed = async move {
            stdin.write_all(content.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        guard.disarm();

        // ESLint exits 1 when it reports lint errors; 2 means it could not run.
        let status_ok = matches!(output.status.code(), Some(0) | Some(1));
        if !status_ok || output.stdout.is_empty() {
            return Err(EngineError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Err(e) = fed {
            tracing::debug!(path = %path.display(), error = %e, "engine closed stdin early");
        }

        parse_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FileReport {
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    rule_id: Option<String>,
    severity: u8,
    message: String,
    line: Option<u32>,
    column: Option<u32>,
}

/// Convert ESLint's `json` formatter output into findings, in report order.
pub fn parse_output(stdout: &[u8]) -> Result<Vec<Finding>, EngineError> {
    let reports: Vec<FileReport> = serde_json::from_slice(stdout)?;

    let findings = reports
        .into_iter()
        .flat_map(|r| r.messages)
        .filter_map(|m| {
            let severity = match m.severity {
                2 => Severity::Error,
                1 => Severity::Warning,
                _ => return None,
            };
            Some(Finding {
                line: m.line.unwrap_or(1).max(1),
                column: m.column.unwrap_or(0),
                message: m.message,
                rule_id: m.rule_id,
                severity,
            })
        })
        .collect();

    Ok(findings)
}
