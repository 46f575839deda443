use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::BackendConnector;
use crate::context::RequestContext;
use crate::error::{Operation, Result, ServiceError};
use crate::models::{DirectoryList, FileSet, Repository};
use crate::resolver::RepositoryResolver;
use crate::service::{Repos, ScopedConnection};

/// Stateless facade over a repository resolver and a content backend.
///
/// Every call resolves the URL, opens one backend connection, sends one
/// request and closes the connection before returning. Nothing is cached or
/// retried, and errors are returned to the caller rather than logged here.
#[derive(Clone)]
pub struct RepoService {
    resolver: Arc<dyn RepositoryResolver>,
    connector: Arc<dyn BackendConnector>,
}

impl RepoService {
    pub fn new(resolver: Arc<dyn RepositoryResolver>, connector: Arc<dyn BackendConnector>) -> Self {
        Self { resolver, connector }
    }

    async fn resolve(&self, ctx: &RequestContext, operation: Operation, repo_url: &str) -> Result<Repository> {
        ctx.run(self.resolver.resolve(ctx, repo_url))
            .await
            .map_err(|source| ServiceError::Resolution {
                operation,
                repo_url: repo_url.to_string(),
                source,
            })
    }

    async fn connect(&self, ctx: &RequestContext, operation: Operation, repo_url: &str) -> Result<ScopedConnection> {
        ctx.run(self.connector.new_connection())
            .await
            .map(ScopedConnection::new)
            .map_err(|source| ServiceError::Connection {
                operation,
                repo_url: repo_url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl Repos for RepoService {
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    async fn get_files(
        &self,
        ctx: &RequestContext,
        repo_url: &str,
        revision: &str,
        pattern: &str,
    ) -> Result<FileSet> {
        let operation = Operation::GetFiles;
        let repo = self.resolve(ctx, operation, repo_url).await?;
        let conn = self.connect(ctx, operation, repo_url).await?;

        let result = ctx.run(conn.request_files(ctx, &repo, revision, pattern)).await;
        conn.release();

        let files = result.map_err(|source| ServiceError::BackendRequest {
            operation,
            repo_url: repo_url.to_string(),
            source,
        })?;
        tracing::debug!(count = files.len(), "Fetched files");
        Ok(files)
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    async fn get_directories(
        &self,
        ctx: &RequestContext,
        repo_url: &str,
        revision: &str,
    ) -> Result<DirectoryList> {
        let operation = Operation::GetDirectories;
        let repo = self.resolve(ctx, operation, repo_url).await?;
        let conn = self.connect(ctx, operation, repo_url).await?;

        let result = ctx.run(conn.request_directories(ctx, &repo, revision)).await;
        conn.release();

        let directories = result.map_err(|source| ServiceError::BackendRequest {
            operation,
            repo_url: repo_url.to_string(),
            source,
        })?;
        tracing::debug!(count = directories.len(), "Fetched directories");
        Ok(directories)
    }
}
