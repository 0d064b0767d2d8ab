//! Bridge to the external lint engine.
//!
//! - [`eslint`] — runs ESLint through `npx` and parses its JSON formatter output.
//! - [`rules`] — the fixed rule configuration handed to ESLint.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::EngineError;
use crate::models::Finding;

pub mod eslint;
pub mod rules;

#[async_trait]
pub trait Engine: Send + Sync {
    /// Lint `content`, reported as if it were the file at `path`.
    async fn analyze(&self, path: &Path, content: &str) -> Result<Vec<Finding>, EngineError>;
}
