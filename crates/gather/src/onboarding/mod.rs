//! Onboarding progress tracking.
//!
//! Each user record embeds an [`OnboardingState`]; the per-step endpoints
//! validate their payload, patch the profile, and advance the tracker one
//! fixed transition at a time.

mod models;
mod service;

pub use models::{
    transition, OnboardingState, OnboardingStatus, OnboardingStep, StepSubmission,
    TransitionError, ValidationError, ABOUT_MAX_CHARS, ABOUT_MIN_CHARS, MAX_AGE, MAX_INTERESTS,
    MAX_PHOTOS, MIN_AGE, MIN_PHOTOS,
};
pub use service::{OnboardingError, OnboardingService};
