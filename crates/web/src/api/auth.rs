//! Login endpoint.
//!
//! Every attempt is written to the `auth_audit` tracing target as
//! `User: <name> | Status: <status>`; the daemon routes that target to the
//! audit log file.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::status::AppError;
use crate::AppState;

/// Tracing target of the authentication audit trail.
pub const AUDIT_TARGET: &str = "auth_audit";

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    dn: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/login", post(login))
}

fn audit(username: &str, status: &str) {
    info!(target: AUDIT_TARGET, "User: {} | Status: {}", username, status);
}

async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials = body.ok().and_then(|Json(req)| {
        let username = req.username.filter(|u| !u.is_empty())?;
        let password = req.password.filter(|p| !p.is_empty())?;
        Some((username, password))
    });
    let Some((username, password)) = credentials else {
        audit("<unknown>", "Missing credentials");
        return Err(AppError::BadRequest("Missing credentials".into()));
    };

    match state.directory.authenticate(&username, &password).await {
        Ok(user) => {
            audit(&username, "Success");
            Ok(Json(LoginResponse {
                message: "Authentication successful",
                dn: user.dn,
            }))
        }
        Err(e) => {
            let status = if e.is_transient() { "Error" } else { "Failed" };
            audit(&username, status);
            Err(e.into())
        }
    }
}
