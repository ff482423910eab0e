//! Gather backend library.
//!
//! Backend for a social/events application: a multi-step onboarding wizard,
//! location-tagged events with attendee lists, service bookings, and
//! profile photo management, all served as stateless JSON handlers over a
//! pooled SQLite store.

pub mod api;
pub mod auth;
pub mod booking;
pub mod event;
pub mod onboarding;
pub mod user;
