//! Identity-sync webhook handlers.
//!
//! The external identity provider delivers `user.created`, `user.updated`,
//! and `user.deleted` events here; this is the only code path that
//! materializes user records. Delivery-signature cryptography is handled by
//! the provider's edge; this endpoint trusts the shared service key.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::ApiResult;
use super::state::AppState;
use crate::user::IdentitySnapshot;

#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: IdentityEventData,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct IdentityEventData {
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    /// Provider-side creation time, epoch milliseconds.
    pub created_at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct IdentitySyncResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<String>,
}

#[instrument(skip(state, headers, event), fields(event_type = %event.event_type))]
pub async fn identity_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<IdentityEvent>,
) -> ApiResult<Json<IdentitySyncResponse>> {
    state.auth.verify_service_key(&headers)?;

    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let user_id = event
                .data
                .id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    super::error::ApiError::BadRequest("missing user id".to_string())
                })?
                .to_string();

            let snapshot = IdentitySnapshot {
                email: event.data.email,
                first_name: event.data.first_name,
                last_name: event.data.last_name,
                image_url: event.data.image_url,
                created_at: event.data.created_at,
            };

            state.users.sync_identity(&user_id, &snapshot).await?;
            debug!("Identity sync upserted user {}", user_id);

            Ok(Json(IdentitySyncResponse {
                ok: true,
                ignored: None,
            }))
        }
        "user.deleted" => {
            if let Some(user_id) = event.data.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
            {
                state.users.soft_delete(user_id).await?;
                debug!("Identity sync soft-deleted user {}", user_id);
            }
            Ok(Json(IdentitySyncResponse {
                ok: true,
                ignored: None,
            }))
        }
        other => Ok(Json(IdentitySyncResponse {
            ok: true,
            ignored: Some(other.to_string()),
        })),
    }
}
