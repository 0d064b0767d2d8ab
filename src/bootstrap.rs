//! Make sure the engine's npm packages are present before linting starts.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use colored::Colorize;
use tokio::process::Command;

use crate::errors::DependencyInstallError;

/// The package manager view the bootstrapper needs.
#[async_trait]
pub trait PackageEnvironment: Send + Sync {
    async fn is_installed(&self, name: &str) -> bool;
    async fn install(&self, names: &[String]) -> Result<(), DependencyInstallError>;
}

/// npm-backed environment rooted at a project directory.
pub struct NpmEnvironment {
    root: PathBuf,
}

impl NpmEnvironment {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PackageEnvironment for NpmEnvironment {
    async fn is_installed(&self, name: &str) -> bool {
        let status = npm(&self.root)
            .args(["ls", "--depth=0", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(error = %e, "npm ls could not be run");
                false
            }
        }
    }

    async fn install(&self, names: &[String]) -> Result<(), DependencyInstallError> {
        let command = format!("npm install --save-dev {}", names.join(" "));
        tracing::info!(%command, root = %self.root.display(), "installing packages");

        // Inherit stdout/stderr so npm's own progress is visible.
        let status = npm(&self.root)
            .args(["install", "--save-dev"])
            .args(names)
            .status()
            .await
            .map_err(|source| DependencyInstallError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(DependencyInstallError::Failed {
                command,
                status: status.to_string(),
            })
        }
    }
}

/// An `npm` invocation outside the terminal's foreground process group, so
/// Ctrl-C reaches only this binary.
fn npm(root: &Path) -> Command {
    let mut cmd = Command::new("npm");
    cmd.current_dir(root).stdin(Stdio::null()).kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// Check every required package and install the full set if any is missing.
pub async fn ensure_dependencies(
    env: &dyn PackageEnvironment,
    packages: &[String],
    quiet: bool,
) -> Result<(), DependencyInstallError> {
    let mut missing = Vec::new();
    for name in packages {
        if !env.is_installed(name).await {
            missing.push(name.as_str());
        }
    }

    if missing.is_empty() {
        if !quiet {
            eprintln!("  {} Required dependencies are already installed.", "→".cyan());
        }
        return Ok(());
    }

    tracing::debug!(?missing, "packages not resolvable");
    if !quiet {
        eprintln!(
            "  {} Missing required dependencies ({}). Installing...",
            "⚠".yellow(),
            missing.join(", ")
        );
    }

    match env.install(packages).await {
        Ok(()) => {
            if !quiet {
                eprintln!("  {} Dependencies installed successfully.", "✓".green());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "  {} Failed to install dependencies. Please install them manually.",
                "✗".red()
            );
            Err(e)
        }
    }
}
