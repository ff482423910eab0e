//! Profile and photo management handlers.
//!
//! - GET    /profile - Client-facing profile view
//! - POST   /profile/photos - Append an uploaded photo reference
//! - DELETE /profile/photos - Remove a photo reference
//!
//! The upload provider is external; these endpoints store and drop the
//! references it hands back.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use super::onboarding_handlers::SubjectQuery;
use super::state::AppState;
use crate::auth::CurrentIdentity;
use crate::onboarding::{MAX_PHOTOS, MIN_PHOTOS};
use crate::user::{PhotoRef, ProfileView, User};

fn user_not_found() -> ApiError {
    ApiError::NotFound("user record not found; identity sync may not have run yet".to_string())
}

async fn load_user(state: &AppState, subject: &str) -> ApiResult<User> {
    state
        .users
        .get(subject)
        .await?
        .ok_or_else(user_not_found)
}

#[instrument(skip(state, identity))]
pub async fn get_profile(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<SubjectQuery>,
) -> ApiResult<Json<ProfileView>> {
    let subject = identity.subject(query.user_id.as_deref())?;
    let user = load_user(&state, &subject).await?;
    Ok(Json(ProfileView::from(&user)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPhotoRequest {
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosResponse {
    pub ok: bool,
    pub photos: Vec<String>,
    pub count: usize,
}

#[instrument(skip(state, identity, request))]
pub async fn add_photo(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<AddPhotoRequest>,
) -> ApiResult<Json<PhotosResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;

    let url = request.url.trim().to_string();
    if url.is_empty() {
        return Err(ApiError::BadRequest("url is required".to_string()));
    }

    let mut user = load_user(&state, &subject).await?;
    if user.profile.photos.len() >= MAX_PHOTOS {
        return Err(ApiError::BadRequest(format!(
            "at most {} photos are allowed",
            MAX_PHOTOS
        )));
    }

    user.profile.photos.push(PhotoRef {
        url,
        key: request.key.filter(|k| !k.trim().is_empty()),
        uploaded_at: Some(Utc::now().to_rfc3339()),
    });

    if !state.users.store_profile(&subject, &user.profile).await? {
        return Err(user_not_found());
    }

    let photos = user.profile.photo_urls();
    Ok(Json(PhotosResponse {
        ok: true,
        count: photos.len(),
        photos,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeletePhotoQuery {
    pub url: Option<String>,
    pub user_id: Option<String>,
}

#[instrument(skip(state, identity))]
pub async fn delete_photo(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<DeletePhotoQuery>,
) -> ApiResult<Json<PhotosResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;

    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("url is required".to_string()))?;

    let mut user = load_user(&state, &subject).await?;

    if !user.profile.photos.iter().any(|p| p.url == url) {
        return Err(ApiError::NotFound("photo not found".to_string()));
    }
    if user.profile.photos.len() <= MIN_PHOTOS {
        return Err(ApiError::BadRequest(format!(
            "keep at least {} photos",
            MIN_PHOTOS
        )));
    }

    user.profile.photos.retain(|p| p.url != url);

    if !state.users.store_profile(&subject, &user.profile).await? {
        return Err(user_not_found());
    }

    let photos = user.profile.photo_urls();
    Ok(Json(PhotosResponse {
        ok: true,
        count: photos.len(),
        photos,
    }))
}
