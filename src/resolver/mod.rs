//! Repository resolution - maps a repository URL to a credentialed descriptor.
//!
//! - `RepositoryResolver`: the single capability the facade needs
//! - `store`: configuration-backed credential store implementing it

pub mod store;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::ResolveError;
use crate::models::Repository;

pub use store::{CredentialTemplate, RepositoryStore, normalize_git_url};

/// Resolve a repository URL into a fully populated `Repository`.
///
/// Implementations must be safe for concurrent use and must fail rather than
/// hang when the URL is unknown.
#[async_trait]
pub trait RepositoryResolver: Send + Sync {
    async fn resolve(&self, ctx: &RequestContext, repo_url: &str) -> Result<Repository, ResolveError>;
}
