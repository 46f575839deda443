use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::DirectoriesResponse;
use crate::routes::AppState;
use crate::routes::files::default_revision;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/repository/directories", get(get_directories))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectoriesQuery {
    repo: String,
    #[serde(default = "default_revision")]
    revision: String,
}

pub(crate) async fn get_directories(
    State(state): State<AppState>,
    Query(query): Query<DirectoriesQuery>,
) -> Result<Json<DirectoriesResponse>> {
    let ctx = state.request.context();
    let directories = state
        .repos
        .get_directories(&ctx, &query.repo, &query.revision)
        .await?;
    Ok(Json(DirectoriesResponse::from(directories)))
}
