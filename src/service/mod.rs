//! The content-retrieval facade.
//!
//! - `Repos`: what callers program against (GetFiles / GetDirectories)
//! - `RepoService`: resolve → connect → request → release, one call at a time
//! - `ScopedConnection`: guarantees the release on every exit path

pub mod repo_service;
pub mod scoped;

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::Result;
use crate::models::{DirectoryList, FileSet};

pub use repo_service::RepoService;
pub use scoped::ScopedConnection;

#[async_trait]
pub trait Repos: Send + Sync {
    /// Content of files (not directories) matching `pattern` at `revision`.
    async fn get_files(
        &self,
        ctx: &RequestContext,
        repo_url: &str,
        revision: &str,
        pattern: &str,
    ) -> Result<FileSet>;

    /// Directories (not files) at `revision`.
    async fn get_directories(
        &self,
        ctx: &RequestContext,
        repo_url: &str,
        revision: &str,
    ) -> Result<DirectoryList>;
}

pub type SharedRepos = Arc<dyn Repos>;
