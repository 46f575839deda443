use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::FilesResponse;
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/repository/files", get(get_files))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilesQuery {
    repo: String,
    #[serde(default = "default_revision")]
    revision: String,
    pattern: String,
}

pub(crate) fn default_revision() -> String {
    "HEAD".to_string()
}

pub(crate) async fn get_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<FilesResponse>> {
    let ctx = state.request.context();
    let files = state
        .repos
        .get_files(&ctx, &query.repo, &query.revision, &query.pattern)
        .await?;
    Ok(Json(FilesResponse::from(files)))
}
