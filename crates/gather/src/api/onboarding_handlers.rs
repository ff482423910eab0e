//! Onboarding API handlers.
//!
//! One endpoint per wizard step plus a status endpoint for client-side
//! routing:
//! - GET  /onboarding/status - Where the client should route the user
//! - POST /onboarding/name
//! - POST /onboarding/date-of-birth
//! - POST /onboarding/gender
//! - GET/POST /onboarding/interests
//! - GET/POST /onboarding/about
//! - POST /onboarding/photos
//!
//! Each POST validates its payload, patches the matching profile fields,
//! and advances the tracker one fixed transition.

use axum::{extract::Query, extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::ApiResult;
use super::state::AppState;
use crate::auth::CurrentIdentity;
use crate::onboarding::{OnboardingState, OnboardingStatus, OnboardingStep, StepSubmission};

/// Explicit subject for service-identity callers.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectQuery {
    pub user_id: Option<String>,
}

/// Step outcome reported by every submission endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub ok: bool,
    pub step: OnboardingStep,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_route: Option<&'static str>,
}

impl From<OnboardingState> for StepResponse {
    fn from(state: OnboardingState) -> Self {
        Self {
            ok: true,
            step: state.step,
            completed: state.completed,
            next_route: (!state.completed).then(|| state.step.client_route()),
        }
    }
}

/// Where the client should send the user next.
#[instrument(skip(state, identity))]
pub async fn get_status(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<SubjectQuery>,
) -> ApiResult<Json<OnboardingStatus>> {
    let subject = identity.subject(query.user_id.as_deref())?;
    let status = state.onboarding.status(&subject).await?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[instrument(skip(state, identity, request))]
pub async fn submit_name(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<NameRequest>,
) -> ApiResult<Json<StepResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;
    let submission = StepSubmission::name(&request.first_name, &request.last_name)?;
    let outcome = state.onboarding.submit(&subject, submission).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateOfBirthRequest {
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateOfBirthResponse {
    #[serde(flatten)]
    pub step: StepResponse,
    pub age: i64,
}

#[instrument(skip(state, identity, request))]
pub async fn submit_date_of_birth(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<DateOfBirthRequest>,
) -> ApiResult<Json<DateOfBirthResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;
    let submission = StepSubmission::date_of_birth(&request.dob, Utc::now().date_naive())?;
    let age = match &submission {
        StepSubmission::DateOfBirth { age, .. } => *age,
        _ => unreachable!(),
    };
    let outcome = state.onboarding.submit(&subject, submission).await?;
    Ok(Json(DateOfBirthResponse {
        step: outcome.into(),
        age,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderRequest {
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[instrument(skip(state, identity, request))]
pub async fn submit_gender(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<GenderRequest>,
) -> ApiResult<Json<StepResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;
    let submission = StepSubmission::gender(&request.gender)?;
    let outcome = state.onboarding.submit(&subject, submission).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestsRequest {
    pub interests: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestsResponse {
    #[serde(flatten)]
    pub step: StepResponse,
    pub interests: Vec<String>,
}

#[instrument(skip(state, identity, request))]
pub async fn submit_interests(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<InterestsRequest>,
) -> ApiResult<Json<InterestsResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;
    let submission = StepSubmission::interests(&request.interests)?;
    let interests = match &submission {
        StepSubmission::Interests(interests) => interests.clone(),
        _ => unreachable!(),
    };
    let outcome = state.onboarding.submit(&subject, submission).await?;
    Ok(Json(InterestsResponse {
        step: outcome.into(),
        interests,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInterestsResponse {
    pub ok: bool,
    pub interests: Vec<String>,
    pub onboarding: OnboardingState,
}

/// Read back previously stored interests.
#[instrument(skip(state, identity))]
pub async fn get_interests(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<SubjectQuery>,
) -> ApiResult<Json<StoredInterestsResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;
    let user = state.onboarding.user(&subject).await?;
    Ok(Json(StoredInterestsResponse {
        ok: true,
        interests: user.profile.interests,
        onboarding: user.onboarding,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutRequest {
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutResponse {
    #[serde(flatten)]
    pub step: StepResponse,
    pub about: String,
}

#[instrument(skip(state, identity, request))]
pub async fn submit_about(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<AboutRequest>,
) -> ApiResult<Json<AboutResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;
    let submission = StepSubmission::about(&request.about)?;
    let about = match &submission {
        StepSubmission::About(about) => about.clone(),
        _ => unreachable!(),
    };
    let outcome = state.onboarding.submit(&subject, submission).await?;
    Ok(Json(AboutResponse {
        step: outcome.into(),
        about,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAboutResponse {
    pub ok: bool,
    pub about: String,
    pub onboarding: OnboardingState,
}

/// Read back the previously stored about text.
#[instrument(skip(state, identity))]
pub async fn get_about(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<SubjectQuery>,
) -> ApiResult<Json<StoredAboutResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;
    let user = state.onboarding.user(&subject).await?;
    Ok(Json(StoredAboutResponse {
        ok: true,
        about: user.profile.about.unwrap_or_default(),
        onboarding: user.onboarding,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosRequest {
    pub photos: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[instrument(skip(state, identity, request))]
pub async fn submit_photos(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<PhotosRequest>,
) -> ApiResult<Json<StepResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;
    let submission = StepSubmission::photos(&request.photos)?;
    let outcome = state.onboarding.submit(&subject, submission).await?;
    Ok(Json(outcome.into()))
}
