//! Content backend - answers file and directory queries for a repository at a revision.
//!
//! - `BackendConnector`: hands out short-lived connections
//! - `BackendConnection`: one connection, closed by its owner when done
//! - `git`: reads content from a local checkout with git2

pub mod git;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::BackendError;
use crate::models::{DirectoryList, FileSet, Repository};

pub use git::{GitConnection, GitConnector};

#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn new_connection(&self) -> Result<Box<dyn BackendConnection>, BackendError>;
}

#[async_trait]
pub trait BackendConnection: Send + Sync {
    /// Content of every file at `revision` whose path matches `pattern`.
    async fn request_files(
        &self,
        ctx: &RequestContext,
        repo: &Repository,
        revision: &str,
        pattern: &str,
    ) -> Result<FileSet, BackendError>;

    /// Every directory path at `revision`.
    async fn request_directories(
        &self,
        ctx: &RequestContext,
        repo: &Repository,
        revision: &str,
    ) -> Result<DirectoryList, BackendError>;

    /// Release the connection. Idempotent, safe after a failed request, and
    /// synchronous because it also runs from `Drop`.
    fn close(&mut self) -> Result<(), BackendError>;
}
