//! Application state shared across handlers.

use sqlx::SqlitePool;

use crate::auth::AuthState;
use crate::booking::BookingRepository;
use crate::event::EventRepository;
use crate::onboarding::OnboardingService;
use crate::user::UserRepository;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub users: UserRepository,
    pub events: EventRepository,
    pub bookings: BookingRepository,
    pub onboarding: OnboardingService,
}

impl AppState {
    /// Wire repositories and services over one pooled connection.
    pub fn new(pool: SqlitePool, auth: AuthState) -> Self {
        let users = UserRepository::new(pool.clone());
        Self {
            auth,
            onboarding: OnboardingService::new(users.clone()),
            users,
            events: EventRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
        }
    }
}
