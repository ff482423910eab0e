//! API route definitions.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::auth_middleware;

use super::booking_handlers;
use super::event_handlers;
use super::handlers;
use super::onboarding_handlers;
use super::profile_handlers;
use super::state::AppState;
use super::webhook_handlers;

/// Create the application router with a configurable request body limit.
pub fn create_router(state: AppState, max_body_size_mb: usize) -> Router {
    let cors = build_cors_layer(&state);
    let max_body_size = max_body_size_mb * 1024 * 1024;

    // Tracing layer with request timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let auth_state = state.auth.clone();

    // Protected routes (identity-resolved)
    let protected_routes = Router::new()
        // Onboarding wizard
        .route("/onboarding/status", get(onboarding_handlers::get_status))
        .route("/onboarding/name", post(onboarding_handlers::submit_name))
        .route(
            "/onboarding/date-of-birth",
            post(onboarding_handlers::submit_date_of_birth),
        )
        .route(
            "/onboarding/gender",
            post(onboarding_handlers::submit_gender),
        )
        .route(
            "/onboarding/interests",
            get(onboarding_handlers::get_interests).post(onboarding_handlers::submit_interests),
        )
        .route(
            "/onboarding/about",
            get(onboarding_handlers::get_about).post(onboarding_handlers::submit_about),
        )
        .route(
            "/onboarding/photos",
            post(onboarding_handlers::submit_photos),
        )
        // Profile
        .route("/profile", get(profile_handlers::get_profile))
        .route(
            "/profile/photos",
            post(profile_handlers::add_photo).delete(profile_handlers::delete_photo),
        )
        .route("/users/{user_id}", get(handlers::get_user))
        // Events
        .route(
            "/events",
            get(event_handlers::list_events).post(event_handlers::create_event),
        )
        .route(
            "/events/{event_id}",
            get(event_handlers::get_event)
                .patch(event_handlers::update_event)
                .delete(event_handlers::delete_event),
        )
        .route("/events/{event_id}/join", post(event_handlers::join_event))
        .route("/events/{event_id}/joined", get(event_handlers::is_joined))
        .route(
            "/events/{event_id}/service-status",
            post(event_handlers::set_service_status),
        )
        .route(
            "/events/{event_id}/attendees",
            get(booking_handlers::event_attendees),
        )
        .route(
            "/events/{event_id}/bookings",
            get(booking_handlers::event_bookings),
        )
        // Attendance views
        .route("/bookings/mine", get(booking_handlers::my_bookings))
        .route("/bookings/going", get(booking_handlers::going))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state.clone());

    // Public routes: liveness and the identity-sync webhook, which carries
    // its own shared-secret check.
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/webhooks/identity", post(webhook_handlers::identity_sync))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors)
        .layer(trace_layer)
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .auth
        .allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}
