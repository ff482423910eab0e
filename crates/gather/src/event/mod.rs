//! Location-tagged events: creation, discovery, joining, service listings.

mod models;
pub(crate) mod repository;

pub use models::{
    haversine_m, norm_key, Attendee, CreateEventRequest, Event, EventKind, EventListQuery,
    EventPatch, EventRow, EventStatus, EventValidationError, Location, LocationSource, Visibility,
    LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT,
};
pub use repository::{EventRepository, JoinOutcome};
