//! Directory user lookup.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use sysadmin_core::directory::DirectoryUser;

use crate::api::status::AppError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/:username", get(get_user))
        .route("/user/:username", get(get_user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<DirectoryUser>, AppError> {
    state
        .directory
        .lookup(&username)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
