//! Content backend over local git checkouts.
//!
//! Each connection reads the repository named by the descriptor's
//! `local_path` (or a `file://` URL) at the requested revision. All git2
//! work runs on the blocking pool and is raced against the request context.
//!
//! - Files: blobs whose repository-relative path matches a glob. `*` stays
//!   within one path component and `**` spans directories, so `*.yaml` only
//!   sees the root and `apps/**/config.json` reaches any depth. Symlinks and
//!   submodules are skipped
//! - Directories: every tree path, recursively, minus hidden directories

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use git2::{FileMode, ObjectType, TreeWalkMode, TreeWalkResult};
use glob::{MatchOptions, Pattern};

use crate::backend::{BackendConnection, BackendConnector};
use crate::context::RequestContext;
use crate::error::BackendError;
use crate::models::{DirectoryList, FileSet, Repository};

#[derive(Debug, Default)]
pub struct GitConnector {
    next_id: AtomicU64,
}

impl GitConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackendConnector for GitConnector {
    async fn new_connection(&self) -> Result<Box<dyn BackendConnection>, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(connection = id, "Opened git connection");
        Ok(Box::new(GitConnection::new(id)))
    }
}

#[derive(Debug)]
pub struct GitConnection {
    id: u64,
    closed: bool,
}

impl GitConnection {
    pub fn new(id: u64) -> Self {
        Self { id, closed: false }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.closed {
            Err(BackendError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BackendConnection for GitConnection {
    async fn request_files(
        &self,
        ctx: &RequestContext,
        repo: &Repository,
        revision: &str,
        pattern: &str,
    ) -> Result<FileSet, BackendError> {
        self.ensure_open()?;
        let path = checkout_path(repo)?;
        let revision = revision.to_string();
        let pattern = pattern.to_string();

        tracing::debug!(connection = self.id, url = %repo.url, %revision, %pattern, "Reading files");
        run_blocking(ctx, move || read_files(&path, &revision, &pattern)).await
    }

    async fn request_directories(
        &self,
        ctx: &RequestContext,
        repo: &Repository,
        revision: &str,
    ) -> Result<DirectoryList, BackendError> {
        self.ensure_open()?;
        let path = checkout_path(repo)?;
        let revision = revision.to_string();

        tracing::debug!(connection = self.id, url = %repo.url, %revision, "Reading directories");
        run_blocking(ctx, move || read_directories(&path, &revision)).await
    }

    fn close(&mut self) -> Result<(), BackendError> {
        if !self.closed {
            self.closed = true;
            tracing::debug!(connection = self.id, "Closed git connection");
        }
        Ok(())
    }
}

const PATH_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

async fn run_blocking<T, F>(ctx: &RequestContext, f: F) -> Result<T, BackendError>
where
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
    T: Send + 'static,
{
    ctx.run(async move {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| BackendError::Task(e.to_string()))
            .and_then(|result| result)
    })
    .await
}

fn checkout_path(repo: &Repository) -> Result<PathBuf, BackendError> {
    if let Some(path) = &repo.local_path {
        return Ok(path.clone());
    }

    repo.url
        .strip_prefix("file://")
        .map(PathBuf::from)
        .ok_or_else(|| BackendError::Unavailable(format!("no local checkout for {}", repo.url)))
}

fn open_repository(path: &Path) -> Result<git2::Repository, BackendError> {
    git2::Repository::open(path)
        .map_err(|e| BackendError::Unavailable(format!("{}: {}", path.display(), e.message())))
}

fn resolve_commit<'r>(repo: &'r git2::Repository, revision: &str) -> Result<git2::Commit<'r>, BackendError> {
    let not_found = || BackendError::RevisionNotFound(revision.to_string());

    if revision.is_empty() || revision == "HEAD" {
        return repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|_| not_found());
    }

    // Branches that only exist on the remote are reachable through origin/.
    let object = repo
        .revparse_single(revision)
        .or_else(|_| repo.revparse_single(&format!("origin/{}", revision)))
        .map_err(|_| not_found())?;

    object.peel_to_commit().map_err(|_| not_found())
}

fn read_files(path: &Path, revision: &str, pattern: &str) -> Result<FileSet, BackendError> {
    if pattern.is_empty() {
        return Err(BackendError::InvalidPattern("pattern must not be empty".to_string()));
    }

    let matcher = Pattern::new(pattern)
        .map_err(|e| BackendError::InvalidPattern(format!("{}: {}", pattern, e)))?;

    let repo = open_repository(path)?;
    let commit = resolve_commit(&repo, revision)?;
    let tree = commit.tree()?;

    let mut files = FileSet::new();
    let mut read_error = None;

    let walked = tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() != Some(ObjectType::Blob) || entry.filemode() == i32::from(FileMode::Link) {
            return TreeWalkResult::Ok;
        }
        let Some(name) = entry.name() else {
            return TreeWalkResult::Ok;
        };

        let entry_path = format!("{}{}", root, name);
        if !matcher.matches_with(&entry_path, PATH_MATCH) {
            return TreeWalkResult::Ok;
        }

        match entry.to_object(&repo).and_then(|obj| obj.peel_to_blob()) {
            Ok(blob) => {
                files.insert(entry_path, blob.content().to_vec());
                TreeWalkResult::Ok
            }
            Err(e) => {
                read_error = Some(e);
                TreeWalkResult::Abort
            }
        }
    });

    if let Some(e) = read_error {
        return Err(e.into());
    }
    walked?;

    Ok(files)
}

fn read_directories(path: &Path, revision: &str) -> Result<DirectoryList, BackendError> {
    let repo = open_repository(path)?;
    let commit = resolve_commit(&repo, revision)?;
    let tree = commit.tree()?;

    let mut directories = DirectoryList::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() != Some(ObjectType::Tree) {
            return TreeWalkResult::Ok;
        }
        match entry.name() {
            Some(name) if !name.starts_with('.') => {
                directories.push(format!("{}{}", root, name));
                TreeWalkResult::Ok
            }
            _ => TreeWalkResult::Skip,
        }
    })?;

    Ok(directories)
}
