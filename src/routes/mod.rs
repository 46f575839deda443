//! API route handlers - exposes the facade over HTTP.
//!
//! - `files`: GET /api/v1/repository/files
//! - `directories`: GET /api/v1/repository/directories

pub mod directories;
pub mod files;

use axum::Router;

use crate::config::RequestSettings;
use crate::service::SharedRepos;

#[derive(Clone)]
pub struct AppState {
    pub repos: SharedRepos,
    pub request: RequestSettings,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(files::routes(state.clone()))
        .merge(directories::routes(state))
}
