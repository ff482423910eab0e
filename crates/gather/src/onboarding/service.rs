//! Onboarding service for validating and advancing user onboarding state.

use thiserror::Error;
use tracing::{debug, instrument};

use super::models::{
    transition, OnboardingState, OnboardingStatus, StepSubmission, TransitionError,
};
use crate::user::{User, UserRepository};

/// Why an onboarding operation failed.
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// The submission was refused by the transition function.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// No live user record exists; the identity-sync webhook is the only
    /// code path that creates one.
    #[error("user record not found")]
    UserNotFound,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Service advancing per-user onboarding state.
///
/// State lives as JSON on the user record; each successful submission is a
/// single update keyed by user id, so two concurrent submissions race at
/// the storage layer with last-write-wins semantics.
#[derive(Debug, Clone)]
pub struct OnboardingService {
    users: UserRepository,
}

impl OnboardingService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Status snapshot for client-side routing.
    ///
    /// A missing record reports the wizard entry point rather than an
    /// error: the client is sent to the start of the flow.
    #[instrument(skip(self))]
    pub async fn status(&self, user_id: &str) -> Result<OnboardingStatus, OnboardingError> {
        let state = self
            .users
            .get(user_id)
            .await?
            .map(|user| user.onboarding)
            .unwrap_or_default();

        Ok(state.into())
    }

    /// Fetch the user backing a read-back endpoint.
    #[instrument(skip(self))]
    pub async fn user(&self, user_id: &str) -> Result<User, OnboardingError> {
        self.users
            .get(user_id)
            .await?
            .ok_or(OnboardingError::UserNotFound)
    }

    /// Apply a validated step submission: patch the profile, advance the
    /// tracker, persist both in one write.
    #[instrument(skip(self, submission), fields(step = %submission.step()))]
    pub async fn submit(
        &self,
        user_id: &str,
        submission: StepSubmission,
    ) -> Result<OnboardingState, OnboardingError> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(OnboardingError::UserNotFound)?;

        let next = transition(user.onboarding.step, submission.step())?;

        let mut profile = user.profile;
        submission.apply(&mut profile);

        let state = OnboardingState {
            step: next,
            completed: next == super::OnboardingStep::Complete,
        };

        if !self.users.store_onboarding(user_id, &profile, &state).await? {
            return Err(OnboardingError::UserNotFound);
        }

        debug!("Advanced onboarding for user {} to {}", user_id, next);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::OnboardingStep;
    use crate::user::IdentitySnapshot;

    async fn setup() -> (OnboardingService, UserRepository) {
        let pool = crate::user::repository::tests::setup_test_db().await;
        let users = UserRepository::new(pool);
        users
            .sync_identity("user-1", &IdentitySnapshot::default())
            .await
            .unwrap();
        (OnboardingService::new(users.clone()), users)
    }

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[tokio::test]
    async fn test_full_flow() {
        let (service, users) = setup().await;

        let steps = [
            StepSubmission::name("Ada", "Lovelace").unwrap(),
            StepSubmission::date_of_birth("1998-03-14", today()).unwrap(),
            StepSubmission::gender("Non-binary").unwrap(),
            StepSubmission::interests(&["chess".to_string(), "running".to_string()]).unwrap(),
            StepSubmission::about("I like long walks on the beach").unwrap(),
            StepSubmission::photos(&[
                "https://cdn.test/a.jpg".to_string(),
                "https://cdn.test/b.jpg".to_string(),
            ])
            .unwrap(),
        ];
        let expected = [
            OnboardingStep::DateOfBirth,
            OnboardingStep::Gender,
            OnboardingStep::Interests,
            OnboardingStep::About,
            OnboardingStep::Photos,
            OnboardingStep::Complete,
        ];

        for (submission, want) in steps.into_iter().zip(expected) {
            let state = service.submit("user-1", submission).await.unwrap();
            assert_eq!(state.step, want);
        }

        let user = users.get("user-1").await.unwrap().unwrap();
        assert!(user.onboarding.completed);
        assert_eq!(user.profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(user.profile.age, Some(28));
        assert_eq!(user.profile.interests, vec!["chess", "running"]);
        assert_eq!(user.profile.photos.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_requires_existing_record() {
        let (service, _) = setup().await;
        let err = service
            .submit("ghost", StepSubmission::name("Ada", "").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, OnboardingError::UserNotFound));
    }

    #[tokio::test]
    async fn test_complete_is_terminal() {
        let (service, users) = setup().await;
        let state = OnboardingState {
            step: OnboardingStep::Complete,
            completed: true,
        };
        users
            .store_onboarding("user-1", &Default::default(), &state)
            .await
            .unwrap();

        let err = service
            .submit("user-1", StepSubmission::name("Ada", "").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OnboardingError::Transition(TransitionError::AlreadyComplete)
        ));
    }

    #[tokio::test]
    async fn test_status_for_missing_record() {
        let (service, _) = setup().await;
        let status = service.status("ghost").await.unwrap();
        assert!(!status.completed);
        assert_eq!(status.step, OnboardingStep::Name);
        assert_eq!(status.next_route, Some("/onboarding/name"));
    }

    #[tokio::test]
    async fn test_resubmitting_same_step() {
        let (service, _) = setup().await;
        let first = service
            .submit("user-1", StepSubmission::name("Ada", "").unwrap())
            .await
            .unwrap();
        assert_eq!(first.step, OnboardingStep::DateOfBirth);

        // Re-submitting the name endpoint re-validates and re-writes the
        // fields; the tracker stays at the step the table dictates.
        let second = service
            .submit("user-1", StepSubmission::name("Beatrix", "").unwrap())
            .await
            .unwrap();
        assert_eq!(second.step, OnboardingStep::DateOfBirth);
    }
}
