//! Error types and HTTP response mapping.
//!
//! Collaborator errors (`ResolveError`, `BackendError`) describe what went
//! wrong inside the resolver or the content backend. The facade wraps them in
//! `ServiceError`, which records the step that failed so callers can tell
//! "repository unknown" from "backend unreachable" from "query rejected".
//!
//! Response mappings for `ServiceError`:
//! - unknown repository → 404
//! - credential store unavailable → 503
//! - connection failure, backend fault → 502
//! - bad revision or pattern → 400
//! - deadline exceeded → 504

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::context::ContextError;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("repository not available to backend: {0}")]
    Unavailable(String),

    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("connection closed")]
    Closed,

    #[error("backend task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("{0}")]
    Other(String),
}

/// The facade operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetFiles,
    GetDirectories,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetFiles => write!(f, "GetFiles"),
            Operation::GetDirectories => write!(f, "GetDirectories"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Connection,
    BackendRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Resolution => "resolution",
            ErrorKind::Connection => "connection",
            ErrorKind::BackendRequest => "backend_request",
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{operation}: error in GetRepository for {repo_url}: {source}")]
    Resolution {
        operation: Operation,
        repo_url: String,
        source: ResolveError,
    },

    #[error("{operation}: failed to connect to content backend for {repo_url}: {source}")]
    Connection {
        operation: Operation,
        repo_url: String,
        source: BackendError,
    },

    #[error("{operation}: content backend request failed for {repo_url}: {source}")]
    BackendRequest {
        operation: Operation,
        repo_url: String,
        source: BackendError,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Resolution { .. } => ErrorKind::Resolution,
            ServiceError::Connection { .. } => ErrorKind::Connection,
            ServiceError::BackendRequest { .. } => ErrorKind::BackendRequest,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ServiceError::Resolution { operation, .. }
            | ServiceError::Connection { operation, .. }
            | ServiceError::BackendRequest { operation, .. } => *operation,
        }
    }

    pub fn repo_url(&self) -> &str {
        match self {
            ServiceError::Resolution { repo_url, .. }
            | ServiceError::Connection { repo_url, .. }
            | ServiceError::BackendRequest { repo_url, .. } => repo_url,
        }
    }

    /// The context error behind this failure, if the caller's context ended the call.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            ServiceError::Resolution {
                source: ResolveError::Context(e),
                ..
            }
            | ServiceError::Connection {
                source: BackendError::Context(e),
                ..
            }
            | ServiceError::BackendRequest {
                source: BackendError::Context(e),
                ..
            } => Some(*e),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        match self.context_error() {
            Some(ContextError::DeadlineExceeded) => return StatusCode::GATEWAY_TIMEOUT,
            // Closest thing to nginx's 499; the client went away.
            Some(ContextError::Cancelled) => return StatusCode::REQUEST_TIMEOUT,
            None => {}
        }

        match self {
            ServiceError::Resolution { source, .. } => match source {
                ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServiceError::Connection { .. } => StatusCode::BAD_GATEWAY,
            ServiceError::BackendRequest { source, .. } => match source {
                BackendError::RevisionNotFound(_) | BackendError::InvalidPattern(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind().as_str(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
