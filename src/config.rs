//! Run settings, layered from TOML files over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root settings structure, deserialized from `.code-analyze.toml`.
///
/// Only run-level knobs live here. The lint rules themselves are fixed, see
/// [`crate::engine::rules`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisSettings,
    pub engine: EngineSettings,
    pub dependencies: DependencySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Maximum number of files analyzed at the same time.
    pub concurrency: usize,
    /// Per-file timeout in seconds.
    pub timeout_secs: u64,
    /// File extensions (without the dot) that are analyzed.
    pub extensions: Vec<String>,
    /// Directory names pruned from the walk.
    pub exclude: Vec<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_secs: 30,
            extensions: ["js", "jsx", "ts", "tsx"].map(String::from).to_vec(),
            exclude: vec!["node_modules".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Launcher used to run ESLint.
    pub program: String,
    /// Arguments placed before ESLint's own flags.
    pub args: Vec<String>,
    /// Directory packages are installed into and resolved from.
    pub env_root: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["--no-install".to_string(), "eslint".to_string()],
            env_root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DependencySettings {
    /// Packages that must be resolvable before any file is linted.
    pub packages: Vec<String>,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            packages: [
                "eslint@8",
                "@typescript-eslint/parser",
                "@typescript-eslint/eslint-plugin",
                "eslint-plugin-import",
                "eslint-plugin-promise",
                "eslint-plugin-node",
                "eslint-plugin-security",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Load settings, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.code-analyze.toml`
/// 3. `~/.config/code-analyze/config.toml`
/// 4. Built-in [`Settings::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Settings> {
    if let Some(path) = config_override {
        return read_settings(path);
    }

    let project_config = project_path.join(".code-analyze.toml");
    if project_config.is_file() {
        return read_settings(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("code-analyze").join("config.toml");
        if home_config.is_file() {
            return read_settings(&home_config);
        }
    }

    Ok(Settings::default())
}

fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let settings = toml::from_str(&content)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}
