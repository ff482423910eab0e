//! Service bookings and attendance views.

mod models;
pub(crate) mod repository;

pub use models::Booking;
pub use repository::{BookingRepository, BOOKINGS_MAX};
