//! Miscellaneous API handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::auth::CurrentIdentity;
use crate::user::ProfileView;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub ok: bool,
    pub user: ProfileView,
}

/// Public profile lookup by user id.
#[instrument(skip(state, _identity))]
pub async fn get_user(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .get(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(Json(UserResponse {
        ok: true,
        user: ProfileView::from(&user),
    }))
}
