//! Event API handlers.
//!
//! Endpoints for event CRUD and attendance:
//! - POST   /events - Create an event
//! - GET    /events - List events with filters
//! - GET    /events/{event_id} - Fetch one event
//! - PATCH  /events/{event_id} - Partial update, creator only
//! - DELETE /events/{event_id} - Delete, creator only
//! - POST   /events/{event_id}/join - Join a free event
//! - GET    /events/{event_id}/joined - Membership check
//! - POST   /events/{event_id}/service-status - Pause/resume a service listing

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use super::onboarding_handlers::SubjectQuery;
use super::state::AppState;
use crate::auth::CurrentIdentity;
use crate::event::{
    Attendee, CreateEventRequest, Event, EventKind, EventListQuery, EventPatch, EventStatus,
    JoinOutcome,
};

fn new_event_id() -> String {
    format!("evt-{}", nanoid::nanoid!(12))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub ok: bool,
    pub event: Event,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEventResponse {
    pub ok: bool,
    pub id: String,
    pub event: Event,
}

#[instrument(skip(state, identity, request))]
pub async fn create_event(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<CreatedEventResponse>)> {
    let creator = identity.subject(request.creator_id.as_deref())?;
    let event = request.into_event(new_event_id(), creator, Utc::now())?;
    state.events.insert(&event).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedEventResponse {
            ok: true,
            id: event.id.clone(),
            event,
        }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub ok: bool,
    pub events: Vec<Event>,
}

#[instrument(skip(state, _identity))]
pub async fn list_events(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    Query(query): Query<EventListQuery>,
) -> ApiResult<Json<EventListResponse>> {
    let events = state.events.list(&query).await?;
    Ok(Json(EventListResponse { ok: true, events }))
}

#[instrument(skip(state, _identity))]
pub async fn get_event(
    State(state): State<AppState>,
    _identity: CurrentIdentity,
    Path(event_id): Path<String>,
) -> ApiResult<Json<EventResponse>> {
    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    Ok(Json(EventResponse { ok: true, event }))
}

#[instrument(skip(state, identity, patch))]
pub async fn update_event(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> ApiResult<Json<EventResponse>> {
    let creator = identity.subject(patch.creator_id.as_deref())?;

    let mut event = state
        .events
        .get(&event_id)
        .await?
        .filter(|event| event.creator_id == creator)
        .ok_or_else(|| {
            ApiError::NotFound("event not found or you are not the creator".to_string())
        })?;

    patch.apply(&mut event, Utc::now())?;
    state.events.update(&event).await?;

    Ok(Json(EventResponse { ok: true, event }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEventResponse {
    pub ok: bool,
    pub deleted_id: String,
}

#[instrument(skip(state, identity))]
pub async fn delete_event(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Query(query): Query<SubjectQuery>,
) -> ApiResult<Json<DeletedEventResponse>> {
    let creator = identity.subject(query.user_id.as_deref())?;

    if !state.events.delete(&event_id, &creator).await? {
        return Err(ApiError::NotFound(
            "event not found or you are not the creator".to_string(),
        ));
    }

    Ok(Json(DeletedEventResponse {
        ok: true,
        deleted_id: event_id,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub ok: bool,
    pub joined: bool,
    pub already_joined: bool,
    pub attendee: Attendee,
}

#[instrument(skip(state, identity, request))]
pub async fn join_event(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Json(request): Json<JoinRequest>,
) -> ApiResult<(StatusCode, Json<JoinResponse>)> {
    let subject = identity.subject(request.user_id.as_deref())?;

    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    // Paid and service events go through the external payment flow.
    if event.kind != EventKind::Free {
        return Err(ApiError::BadRequest(
            "payment required: use the payment flow for paid/service events".to_string(),
        ));
    }

    let attendee = Attendee {
        user_id: subject,
        name: request.name.trim().to_string(),
        email: request.email.trim().to_string(),
        image_url: request.image_url.trim().to_string(),
        joined_at: Utc::now().to_rfc3339(),
    };

    let outcome = state
        .events
        .join(&event_id, attendee.clone())
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    let already_joined = outcome == JoinOutcome::AlreadyJoined;
    let status = if already_joined {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(JoinResponse {
            ok: true,
            joined: true,
            already_joined,
            attendee,
        }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedResponse {
    pub ok: bool,
    pub joined: bool,
}

#[instrument(skip(state, identity))]
pub async fn is_joined(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Query(query): Query<SubjectQuery>,
) -> ApiResult<Json<JoinedResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;

    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    Ok(Json(JoinedResponse {
        ok: true,
        joined: event.is_attendee(&subject),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusRequest {
    pub enabled: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusResponse {
    pub ok: bool,
    pub status: EventStatus,
    pub event: Event,
}

/// Pause or resume a service listing. Creator only.
#[instrument(skip(state, identity, request))]
pub async fn set_service_status(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Json(request): Json<ServiceStatusRequest>,
) -> ApiResult<Json<ServiceStatusResponse>> {
    let subject = identity.subject(request.user_id.as_deref())?;

    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    if event.creator_id != subject {
        return Err(ApiError::Forbidden("not the creator".to_string()));
    }
    if event.kind != EventKind::Service {
        return Err(ApiError::BadRequest(
            "only service listings can be toggled".to_string(),
        ));
    }

    let status = if request.enabled {
        EventStatus::Active
    } else {
        EventStatus::Paused
    };

    let event = state
        .events
        .set_status(&event_id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    Ok(Json(ServiceStatusResponse {
        ok: true,
        status,
        event,
    }))
}
