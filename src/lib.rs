//! repo-content - files and directory listings from git repositories at a revision.
//!
//! Callers ask [`Repos`] for "the files matching P at revision R in repository
//! U" or "the directories at revision R in repository U". [`RepoService`]
//! resolves U to a credentialed [`Repository`] through a [`RepositoryResolver`],
//! opens one connection from a [`BackendConnector`], sends one request and
//! closes the connection again on every exit path.

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod service;

pub use backend::{BackendConnection, BackendConnector, GitConnector};
pub use context::{ContextError, RequestContext};
pub use error::{BackendError, ErrorKind, Operation, ResolveError, ServiceError};
pub use models::{DirectoryList, FileSet, Repository};
pub use resolver::{RepositoryResolver, RepositoryStore};
pub use service::{RepoService, Repos};
