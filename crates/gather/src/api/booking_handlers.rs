//! Attendance and booking view handlers.
//!
//! - GET /bookings/mine - Events the subject created, with upcoming/past splits
//! - GET /bookings/going - Events the subject joined
//! - GET /events/{event_id}/attendees - Attendee list, creator only
//! - GET /events/{event_id}/bookings - Service bookings, creator only

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::auth::CurrentIdentity;
use crate::booking::Booking;
use crate::event::{Event, EventKind, LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingsQuery {
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

impl BookingsQuery {
    fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(LIST_DEFAULT_LIMIT)
            .clamp(1, LIST_MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBookingsResponse {
    pub ok: bool,
    pub created_events: Vec<Event>,
    pub created_upcoming: Vec<Event>,
    pub created_past: Vec<Event>,
    pub going_events: Vec<Event>,
}

/// Events the subject created, newest first, with convenience splits by
/// start instant. Events with no resolvable start count as upcoming.
#[instrument(skip(state, identity))]
pub async fn my_bookings(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Json<MyBookingsResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;
    let limit = query.effective_limit();

    let created_events = state.events.created_by(&subject, limit).await?;
    let going_events = state.events.going(&subject, limit).await?;

    let now = Utc::now();
    let (created_upcoming, created_past): (Vec<Event>, Vec<Event>) = created_events
        .iter()
        .cloned()
        .partition(|e| e.start_instant().map(|t| t >= now).unwrap_or(true));

    Ok(Json(MyBookingsResponse {
        ok: true,
        created_events,
        created_upcoming,
        created_past,
        going_events,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoingResponse {
    pub ok: bool,
    pub going_events: Vec<Event>,
}

#[instrument(skip(state, identity))]
pub async fn going(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Query(query): Query<BookingsQuery>,
) -> ApiResult<Json<GoingResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;
    let going_events = state
        .events
        .going(&subject, query.effective_limit())
        .await?;

    Ok(Json(GoingResponse {
        ok: true,
        going_events,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatorQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeView {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub joined_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeesResponse {
    pub ok: bool,
    pub attendees: Vec<AttendeeView>,
}

/// Attendee list for an event, enriched from stored user records where a
/// profile exists. Creator only.
#[instrument(skip(state, identity))]
pub async fn event_attendees(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Query(query): Query<CreatorQuery>,
) -> ApiResult<Json<AttendeesResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;

    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    if event.creator_id != subject {
        return Err(ApiError::Forbidden("not the creator".to_string()));
    }

    let ids: Vec<String> = event.attendees.iter().map(|a| a.user_id.clone()).collect();
    let users = state.users.get_many(&ids).await?;

    let attendees = event
        .attendees
        .into_iter()
        .map(|attendee| {
            let user = users.iter().find(|u| u.id == attendee.user_id);
            let name = user
                .map(|u| u.profile.display_name(&u.identity))
                .filter(|n| !n.is_empty())
                .unwrap_or(attendee.name);
            let email = user
                .and_then(|u| u.identity.email.clone())
                .unwrap_or(attendee.email);
            let image_url = user
                .and_then(|u| u.identity.image_url.clone())
                .unwrap_or(attendee.image_url);
            AttendeeView {
                user_id: attendee.user_id,
                name,
                email,
                image_url,
                joined_at: attendee.joined_at,
            }
        })
        .collect();

    Ok(Json(AttendeesResponse {
        ok: true,
        attendees,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub ok: bool,
    pub bookings: Vec<Booking>,
}

/// Service bookings for an event. Creator only, service listings only.
#[instrument(skip(state, identity))]
pub async fn event_bookings(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(event_id): Path<String>,
    Query(query): Query<CreatorQuery>,
) -> ApiResult<Json<BookingsResponse>> {
    let subject = identity.subject(query.user_id.as_deref())?;

    let event = state
        .events
        .get(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    if event.creator_id != subject {
        return Err(ApiError::Forbidden("not the creator".to_string()));
    }
    if event.kind != EventKind::Service {
        return Err(ApiError::BadRequest("not a service event".to_string()));
    }

    let bookings = state.bookings.list_for_event(&event_id).await?;
    Ok(Json(BookingsResponse { ok: true, bookings }))
}
