//! Onboarding data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user::{Gender, PhotoRef, Profile};

/// Maximum number of interests a profile may carry.
pub const MAX_INTERESTS: usize = 20;
/// Bounds for the about text, in characters, after trimming.
pub const ABOUT_MIN_CHARS: usize = 10;
pub const ABOUT_MAX_CHARS: usize = 500;
/// Bounds for the profile photo list.
pub const MIN_PHOTOS: usize = 2;
pub const MAX_PHOTOS: usize = 6;
/// Accepted age range derived from the date of birth.
pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 100;

/// Onboarding step enumeration.
///
/// Users progress through these steps in a fixed order:
/// 1. Name - First and last name
/// 2. DateOfBirth - Age-gated date of birth
/// 3. Gender - One of a closed option set
/// 4. Interests - At least one free-form interest
/// 5. About - Short self description
/// 6. Photos - Two to six profile photos
/// 7. Complete - Onboarding finished
///
/// `None` is the state a record is materialized with before the wizard
/// starts. An unknown value read from storage falls back to `Name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OnboardingStep {
    #[default]
    None,
    Name,
    DateOfBirth,
    Gender,
    Interests,
    About,
    Photos,
    Complete,
}

impl OnboardingStep {
    pub fn as_str(self) -> &'static str {
        match self {
            OnboardingStep::None => "none",
            OnboardingStep::Name => "name",
            OnboardingStep::DateOfBirth => "dateOfBirth",
            OnboardingStep::Gender => "gender",
            OnboardingStep::Interests => "interests",
            OnboardingStep::About => "about",
            OnboardingStep::Photos => "photos",
            OnboardingStep::Complete => "complete",
        }
    }

    /// Position along the fixed sequence. Used to forbid skipping ahead
    /// and to keep the tracker from moving backward.
    pub fn position(self) -> u8 {
        match self {
            OnboardingStep::None => 0,
            OnboardingStep::Name => 1,
            OnboardingStep::DateOfBirth => 2,
            OnboardingStep::Gender => 3,
            OnboardingStep::Interests => 4,
            OnboardingStep::About => 5,
            OnboardingStep::Photos => 6,
            OnboardingStep::Complete => 7,
        }
    }

    /// The fixed successor of this step.
    pub fn next(self) -> Self {
        match self {
            OnboardingStep::None => OnboardingStep::Name,
            OnboardingStep::Name => OnboardingStep::DateOfBirth,
            OnboardingStep::DateOfBirth => OnboardingStep::Gender,
            OnboardingStep::Gender => OnboardingStep::Interests,
            OnboardingStep::Interests => OnboardingStep::About,
            OnboardingStep::About => OnboardingStep::Photos,
            OnboardingStep::Photos => OnboardingStep::Complete,
            OnboardingStep::Complete => OnboardingStep::Complete,
        }
    }

    /// `None` reports the wizard entry point; everything else is itself.
    pub fn or_start(self) -> Self {
        if self == OnboardingStep::None {
            OnboardingStep::Name
        } else {
            self
        }
    }

    /// Client route the wizard should show for this step.
    pub fn client_route(self) -> &'static str {
        match self {
            OnboardingStep::None | OnboardingStep::Name => "/onboarding/name",
            OnboardingStep::DateOfBirth => "/onboarding/date-of-birth",
            OnboardingStep::Gender => "/onboarding/gender",
            OnboardingStep::Interests => "/onboarding/interests",
            OnboardingStep::About => "/onboarding/about",
            OnboardingStep::Photos => "/onboarding/photos",
            OnboardingStep::Complete => "/home",
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OnboardingStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OnboardingStep::None),
            "name" => Ok(OnboardingStep::Name),
            "dateOfBirth" => Ok(OnboardingStep::DateOfBirth),
            "gender" => Ok(OnboardingStep::Gender),
            "interests" => Ok(OnboardingStep::Interests),
            "about" => Ok(OnboardingStep::About),
            "photos" => Ok(OnboardingStep::Photos),
            "complete" => Ok(OnboardingStep::Complete),
            _ => Err(format!("Invalid onboarding step: {}", s)),
        }
    }
}

// Storage may hold values written by older builds; anything unrecognized
// deserializes as the initial step rather than failing the whole record.
impl From<String> for OnboardingStep {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(OnboardingStep::Name)
    }
}

impl From<OnboardingStep> for String {
    fn from(step: OnboardingStep) -> Self {
        step.as_str().to_string()
    }
}

/// Onboarding tracker embedded in a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OnboardingState {
    /// Current step.
    #[serde(default)]
    pub step: OnboardingStep,

    /// True iff `step == complete`.
    #[serde(default)]
    pub completed: bool,
}

impl OnboardingState {
    /// Fresh tracker for a newly materialized user record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_onboarding(&self) -> bool {
        !self.completed
    }
}

/// Why a submission was refused by the transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("onboarding is already complete")]
    AlreadyComplete,

    #[error("complete the {expected} step before submitting {submitted}")]
    OutOfOrder {
        expected: OnboardingStep,
        submitted: OnboardingStep,
    },
}

/// Compute the step a successful submission moves the tracker to.
///
/// The tracker only ever moves forward along the fixed sequence: a completed
/// flow rejects every further submission, a step later than the current
/// position cannot be submitted, and re-submitting an earlier step re-writes
/// its profile fields without regressing the tracker.
pub fn transition(
    current: OnboardingStep,
    submitted: OnboardingStep,
) -> Result<OnboardingStep, TransitionError> {
    if current == OnboardingStep::Complete {
        return Err(TransitionError::AlreadyComplete);
    }

    let expected = current.or_start();
    if submitted.position() > expected.position() {
        return Err(TransitionError::OutOfOrder {
            expected,
            submitted,
        });
    }

    let next = submitted.next();
    if next.position() > current.position() {
        Ok(next)
    } else {
        Ok(current)
    }
}

/// A validated step submission.
///
/// Constructors perform the per-step validation; a value of this type is
/// ready to be applied to a profile and fed through [`transition`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepSubmission {
    Name {
        first_name: String,
        last_name: Option<String>,
    },
    DateOfBirth {
        dob: String,
        age: i64,
    },
    Gender(Gender),
    Interests(Vec<String>),
    About(String),
    Photos(Vec<PhotoRef>),
}

/// A rejected step input, with a message naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

fn invalid(msg: impl Into<String>) -> ValidationError {
    ValidationError(msg.into())
}

impl StepSubmission {
    /// Validate the name step: firstName must be non-empty after trimming.
    pub fn name(first_name: &str, last_name: &str) -> Result<Self, ValidationError> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(invalid("firstName is required"));
        }
        let last_name = last_name.trim();
        Ok(StepSubmission::Name {
            first_name: first_name.to_string(),
            last_name: (!last_name.is_empty()).then(|| last_name.to_string()),
        })
    }

    /// Validate the date-of-birth step against `today`.
    pub fn date_of_birth(dob: &str, today: NaiveDate) -> Result<Self, ValidationError> {
        let dob = dob.trim();
        let parsed = (dob.len() == 10)
            .then(|| NaiveDate::parse_from_str(dob, "%Y-%m-%d").ok())
            .flatten()
            .ok_or_else(|| invalid("dob must be YYYY-MM-DD"))?;

        use chrono::Datelike;
        let mut age = i64::from(today.year() - parsed.year());
        if (today.month(), today.day()) < (parsed.month(), parsed.day()) {
            age -= 1;
        }

        if age < MIN_AGE {
            return Err(invalid("you must be at least 18 years old"));
        }
        if age > MAX_AGE {
            return Err(invalid("dob is not a valid date of birth"));
        }

        Ok(StepSubmission::DateOfBirth {
            dob: dob.to_string(),
            age,
        })
    }

    /// Validate the gender step against the closed option set.
    pub fn gender(raw: &str) -> Result<Self, ValidationError> {
        raw.trim()
            .parse::<Gender>()
            .map(StepSubmission::Gender)
            .map_err(|_| invalid("invalid gender option"))
    }

    /// Validate the interests step: de-duplicated, trimmed, non-empty
    /// entries, between one and [`MAX_INTERESTS`].
    pub fn interests(raw: &[String]) -> Result<Self, ValidationError> {
        let mut seen = std::collections::HashSet::new();
        let mut interests = Vec::new();
        for entry in raw {
            let entry = entry.trim();
            if entry.is_empty() || !seen.insert(entry.to_string()) {
                continue;
            }
            interests.push(entry.to_string());
        }

        if interests.is_empty() {
            return Err(invalid("interests must contain at least one entry"));
        }
        if interests.len() > MAX_INTERESTS {
            return Err(invalid(format!(
                "interests must contain at most {} entries",
                MAX_INTERESTS
            )));
        }

        Ok(StepSubmission::Interests(interests))
    }

    /// Validate the about step: trimmed length within bounds.
    pub fn about(raw: &str) -> Result<Self, ValidationError> {
        let about = raw.trim();
        let chars = about.chars().count();
        if chars < ABOUT_MIN_CHARS {
            return Err(invalid(format!(
                "about must be at least {} characters",
                ABOUT_MIN_CHARS
            )));
        }
        if chars > ABOUT_MAX_CHARS {
            return Err(invalid(format!(
                "about must be at most {} characters",
                ABOUT_MAX_CHARS
            )));
        }
        Ok(StepSubmission::About(about.to_string()))
    }

    /// Validate the photos step: two to six non-empty URLs.
    pub fn photos(raw: &[String]) -> Result<Self, ValidationError> {
        let photos: Vec<PhotoRef> = raw
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(PhotoRef::from_url)
            .collect();

        if photos.len() < MIN_PHOTOS {
            return Err(invalid(format!(
                "at least {} photos are required",
                MIN_PHOTOS
            )));
        }
        if photos.len() > MAX_PHOTOS {
            return Err(invalid(format!("at most {} photos are allowed", MAX_PHOTOS)));
        }

        Ok(StepSubmission::Photos(photos))
    }

    /// The step this submission completes.
    pub fn step(&self) -> OnboardingStep {
        match self {
            StepSubmission::Name { .. } => OnboardingStep::Name,
            StepSubmission::DateOfBirth { .. } => OnboardingStep::DateOfBirth,
            StepSubmission::Gender(_) => OnboardingStep::Gender,
            StepSubmission::Interests(_) => OnboardingStep::Interests,
            StepSubmission::About(_) => OnboardingStep::About,
            StepSubmission::Photos(_) => OnboardingStep::Photos,
        }
    }

    /// Write this submission's fields into the profile.
    pub fn apply(&self, profile: &mut Profile) {
        match self {
            StepSubmission::Name {
                first_name,
                last_name,
            } => {
                profile.first_name = Some(first_name.clone());
                profile.last_name = last_name.clone();
            }
            StepSubmission::DateOfBirth { dob, age } => {
                profile.dob = Some(dob.clone());
                profile.age = Some(*age);
            }
            StepSubmission::Gender(gender) => {
                profile.gender = Some(*gender);
            }
            StepSubmission::Interests(interests) => {
                profile.interests = interests.clone();
            }
            StepSubmission::About(about) => {
                profile.about = Some(about.clone());
            }
            StepSubmission::Photos(photos) => {
                profile.photos = photos.clone();
            }
        }
    }
}

/// Snapshot reported by the status endpoint for client-side routing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub completed: bool,
    pub step: OnboardingStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_route: Option<&'static str>,
}

impl From<OnboardingState> for OnboardingStatus {
    fn from(state: OnboardingState) -> Self {
        let step = state.step.or_start();
        let completed = state.completed || step == OnboardingStep::Complete;
        Self {
            completed,
            step,
            next_route: (!completed).then(|| step.client_route()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_step_sequence() {
        let mut step = OnboardingStep::None;
        let expected = [
            OnboardingStep::Name,
            OnboardingStep::DateOfBirth,
            OnboardingStep::Gender,
            OnboardingStep::Interests,
            OnboardingStep::About,
            OnboardingStep::Photos,
            OnboardingStep::Complete,
            OnboardingStep::Complete,
        ];
        for want in expected {
            step = step.next();
            assert_eq!(step, want);
        }
    }

    #[test]
    fn test_unknown_step_falls_back_to_name() {
        let step: OnboardingStep = serde_json::from_str("\"sparkles\"").unwrap();
        assert_eq!(step, OnboardingStep::Name);

        let step: OnboardingStep = serde_json::from_str("\"dateOfBirth\"").unwrap();
        assert_eq!(step, OnboardingStep::DateOfBirth);
    }

    #[test]
    fn test_transition_advances_one_step() {
        let next = transition(OnboardingStep::None, OnboardingStep::Name).unwrap();
        assert_eq!(next, OnboardingStep::DateOfBirth);

        let next = transition(OnboardingStep::Photos, OnboardingStep::Photos).unwrap();
        assert_eq!(next, OnboardingStep::Complete);
    }

    #[test]
    fn test_transition_rejects_skipping() {
        let err = transition(OnboardingStep::None, OnboardingStep::About).unwrap_err();
        assert_eq!(
            err,
            TransitionError::OutOfOrder {
                expected: OnboardingStep::Name,
                submitted: OnboardingStep::About,
            }
        );
    }

    #[test]
    fn test_transition_rejects_after_complete() {
        let err = transition(OnboardingStep::Complete, OnboardingStep::Photos).unwrap_err();
        assert_eq!(err, TransitionError::AlreadyComplete);
    }

    #[test]
    fn test_transition_redo_never_moves_backward() {
        // Redoing gender while already at about keeps the tracker at about.
        let next = transition(OnboardingStep::About, OnboardingStep::Gender).unwrap();
        assert_eq!(next, OnboardingStep::About);
    }

    #[test]
    fn test_name_validation() {
        assert!(StepSubmission::name("   ", "Doe").is_err());

        let sub = StepSubmission::name("  Ada ", " ").unwrap();
        assert_eq!(
            sub,
            StepSubmission::Name {
                first_name: "Ada".to_string(),
                last_name: None,
            }
        );
    }

    #[test]
    fn test_age_boundaries() {
        // 17 years old tomorrow: rejected.
        assert!(StepSubmission::date_of_birth("2008-08-08", today()).is_err());
        // Exactly 18 today: accepted.
        let sub = StepSubmission::date_of_birth("2008-08-07", today()).unwrap();
        assert!(matches!(sub, StepSubmission::DateOfBirth { age: 18, .. }));
        // Exactly 100: accepted.
        let sub = StepSubmission::date_of_birth("1926-08-07", today()).unwrap();
        assert!(matches!(sub, StepSubmission::DateOfBirth { age: 100, .. }));
        // 101: rejected.
        assert!(StepSubmission::date_of_birth("1925-08-07", today()).is_err());
    }

    #[test]
    fn test_dob_format() {
        assert!(StepSubmission::date_of_birth("07/08/2000", today()).is_err());
        assert!(StepSubmission::date_of_birth("2000-8-7", today()).is_err());
        assert!(StepSubmission::date_of_birth("2000-13-40", today()).is_err());
    }

    #[test]
    fn test_interests_dedupe() {
        let sub = StepSubmission::interests(&[
            "a".to_string(),
            " a ".to_string(),
            "b".to_string(),
            "".to_string(),
        ])
        .unwrap();
        assert_eq!(
            sub,
            StepSubmission::Interests(vec!["a".to_string(), "b".to_string()])
        );

        assert!(StepSubmission::interests(&["  ".to_string()]).is_err());

        let many: Vec<String> = (0..MAX_INTERESTS + 1).map(|i| format!("i{i}")).collect();
        assert!(StepSubmission::interests(&many).is_err());
    }

    #[test]
    fn test_about_boundaries() {
        assert!(StepSubmission::about(&"x".repeat(9)).is_err());
        assert!(StepSubmission::about(&"x".repeat(10)).is_ok());
        assert!(StepSubmission::about(&"x".repeat(500)).is_ok());
        assert!(StepSubmission::about(&"x".repeat(501)).is_err());
        // Trimming happens before the length check.
        assert!(StepSubmission::about("  123456789  ").is_err());
    }

    #[test]
    fn test_photo_count_boundaries() {
        let urls = |n: usize| -> Vec<String> {
            (0..n).map(|i| format!("https://cdn.test/p{i}.jpg")).collect()
        };
        assert!(StepSubmission::photos(&urls(1)).is_err());
        assert!(StepSubmission::photos(&urls(2)).is_ok());
        assert!(StepSubmission::photos(&urls(6)).is_ok());
        assert!(StepSubmission::photos(&urls(7)).is_err());
    }

    #[test]
    fn test_status_reports_entry_route() {
        let status: OnboardingStatus = OnboardingState::new().into();
        assert!(!status.completed);
        assert_eq!(status.step, OnboardingStep::Name);
        assert_eq!(status.next_route, Some("/onboarding/name"));

        let status: OnboardingStatus = OnboardingState {
            step: OnboardingStep::Complete,
            completed: true,
        }
        .into();
        assert!(status.completed);
        assert_eq!(status.next_route, None);
    }
}
