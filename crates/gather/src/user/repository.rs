//! User repository for database operations.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{IdentitySnapshot, Profile, User, UserRow};
use crate::onboarding::OnboardingState;

/// Repository for user database operations.
///
/// The `identity`, `profile`, and `onboarding` columns hold JSON objects;
/// every write serializes the full object, mirroring a document-store
/// merge keyed by user id.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a live (not soft-deleted) user by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, identity, profile, onboarding, is_deleted, created_at, updated_at, deleted_at
            FROM users
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching user")?;

        Ok(row.map(User::from))
    }

    /// Get several live users at once, for attendee enrichment.
    #[instrument(skip(self, ids))]
    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, identity, profile, onboarding, is_deleted, created_at, updated_at, deleted_at \
             FROM users WHERE is_deleted = 0 AND id IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("fetching users by id")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Upsert the identity snapshot for a user.
    ///
    /// Matches the identity-sync contract: the snapshot and the updated
    /// timestamp are always written, while profile and onboarding defaults
    /// are insert-only so a re-delivered event never resets wizard progress.
    #[instrument(skip(self, snapshot))]
    pub async fn sync_identity(&self, id: &str, snapshot: &IdentitySnapshot) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let identity_json =
            serde_json::to_string(snapshot).context("serializing identity snapshot")?;
        let profile_json =
            serde_json::to_string(&Profile::default()).context("serializing profile defaults")?;
        let onboarding_json = serde_json::to_string(&OnboardingState::new())
            .context("serializing onboarding defaults")?;

        sqlx::query(
            r#"
            INSERT INTO users (id, identity, profile, onboarding, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                identity = excluded.identity,
                is_deleted = 0,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(&identity_json)
        .bind(&profile_json)
        .bind(&onboarding_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("upserting user identity")?;

        debug!("Synced identity for user {}", id);

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after identity sync"))
    }

    /// Soft-delete a user.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET is_deleted = 1, deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("soft-deleting user")?;

        Ok(())
    }

    /// Persist an onboarding step's outcome: the patched profile and the
    /// advanced tracker, in one write.
    ///
    /// Returns false when no live record matched.
    #[instrument(skip(self, profile, state))]
    pub async fn store_onboarding(
        &self,
        id: &str,
        profile: &Profile,
        state: &OnboardingState,
    ) -> Result<bool> {
        let profile_json = serde_json::to_string(profile).context("serializing profile")?;
        let state_json = serde_json::to_string(state).context("serializing onboarding state")?;

        let result = sqlx::query(
            "UPDATE users SET profile = ?, onboarding = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(&profile_json)
        .bind(&state_json)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("storing onboarding state")?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist the profile object alone.
    ///
    /// Returns false when no live record matched.
    #[instrument(skip(self, profile))]
    pub async fn store_profile(&self, id: &str, profile: &Profile) -> Result<bool> {
        let profile_json = serde_json::to_string(profile).context("serializing profile")?;

        let result =
            sqlx::query("UPDATE users SET profile = ?, updated_at = ? WHERE id = ? AND is_deleted = 0")
                .bind(&profile_json)
                .bind(Utc::now().to_rfc3339())
                .bind(id)
                .execute(&self.pool)
                .await
                .context("storing profile")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE users (
                id TEXT PRIMARY KEY NOT NULL,
                identity TEXT NOT NULL DEFAULT '{}',
                profile TEXT NOT NULL DEFAULT '{}',
                onboarding TEXT NOT NULL DEFAULT '{}',
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    fn snapshot() -> IdentitySnapshot {
        IdentitySnapshot {
            email: Some("ada@example.com".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            image_url: None,
            created_at: Some(1_700_000_000_000),
        }
    }

    #[tokio::test]
    async fn test_sync_identity_creates_defaults() {
        let repo = UserRepository::new(setup_test_db().await);

        let user = repo.sync_identity("user-1", &snapshot()).await.unwrap();
        assert_eq!(user.identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.profile, Profile::default());
        assert!(!user.onboarding.completed);
        assert_eq!(
            user.onboarding.step,
            crate::onboarding::OnboardingStep::None
        );
    }

    #[tokio::test]
    async fn test_sync_identity_preserves_progress() {
        let repo = UserRepository::new(setup_test_db().await);
        repo.sync_identity("user-1", &snapshot()).await.unwrap();

        let profile = Profile {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        let state = OnboardingState {
            step: crate::onboarding::OnboardingStep::DateOfBirth,
            completed: false,
        };
        assert!(repo.store_onboarding("user-1", &profile, &state).await.unwrap());

        // A re-delivered identity event must not reset wizard progress.
        let user = repo.sync_identity("user-1", &snapshot()).await.unwrap();
        assert_eq!(user.profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(
            user.onboarding.step,
            crate::onboarding::OnboardingStep::DateOfBirth
        );
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user() {
        let repo = UserRepository::new(setup_test_db().await);
        repo.sync_identity("user-1", &snapshot()).await.unwrap();

        repo.soft_delete("user-1").await.unwrap();
        assert!(repo.get("user-1").await.unwrap().is_none());

        // Writes against a soft-deleted record report no match.
        assert!(
            !repo
                .store_profile("user-1", &Profile::default())
                .await
                .unwrap()
        );

        // A fresh identity event revives the record.
        let user = repo.sync_identity("user-1", &snapshot()).await.unwrap();
        assert!(!user.is_deleted);
    }

    #[tokio::test]
    async fn test_get_many_filters_unknown_ids() {
        let repo = UserRepository::new(setup_test_db().await);
        repo.sync_identity("user-1", &snapshot()).await.unwrap();
        repo.sync_identity("user-2", &snapshot()).await.unwrap();

        let users = repo
            .get_many(&[
                "user-1".to_string(),
                "user-2".to_string(),
                "ghost".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
    }
}
