//! Process-launch collaborator surface.

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// OS process collaborator: executable resolution, spawn, terminate.
#[async_trait]
pub trait ProcessHost: Send + Sync {
    /// Spawn an executable with arguments, returning the child pid.
    async fn spawn(&self, program: &Path, args: &[String]) -> Result<u32>;

    /// Resolve a bare command name on PATH.
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Terminate processes whose name matches `name`. Returns `true` if
    /// anything was terminated.
    async fn terminate_matching(&self, name: &str) -> Result<bool>;

    /// Open a URL in the default browser.
    async fn open_url(&self, url: &str) -> Result<()>;
}
