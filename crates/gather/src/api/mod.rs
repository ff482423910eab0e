//! HTTP API module.
//!
//! Stateless JSON handlers over the shared [`AppState`]: every route
//! validates its payload, performs one or a few storage operations, and
//! returns `{ ok: true, ... }` or `{ error, code }`.

mod booking_handlers;
mod error;
mod event_handlers;
mod handlers;
mod onboarding_handlers;
mod profile_handlers;
mod routes;
mod state;
mod webhook_handlers;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
