//! User data models.
//!
//! A user record is keyed by the caller identity id and carries three
//! embedded JSON objects: the `identity` snapshot written by the
//! identity-sync webhook, the `profile` filled in during onboarding, and the
//! `onboarding` tracker itself.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::onboarding::OnboardingState;

/// Closed set of gender options offered by the profile wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Non-binary")]
    NonBinary,
    #[serde(rename = "Prefer not to say")]
    PreferNotToSay,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NonBinary => "Non-binary",
            Gender::PreferNotToSay => "Prefer not to say",
            Gender::Other => "Other",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Non-binary" => Ok(Gender::NonBinary),
            "Prefer not to say" => Ok(Gender::PreferNotToSay),
            "Other" => Ok(Gender::Other),
            _ => Err(format!("Invalid gender option: {}", s)),
        }
    }
}

/// Reference to a stored profile photo.
///
/// Older records stored bare URL strings; those deserialize into a
/// reference with no upload key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PhotoRefCompat")]
pub struct PhotoRef {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhotoRefCompat {
    Url(String),
    Full {
        url: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default, rename = "uploadedAt")]
        uploaded_at: Option<String>,
    },
}

impl From<PhotoRefCompat> for PhotoRef {
    fn from(compat: PhotoRefCompat) -> Self {
        match compat {
            PhotoRefCompat::Url(url) => PhotoRef {
                url,
                key: None,
                uploaded_at: None,
            },
            PhotoRefCompat::Full {
                url,
                key,
                uploaded_at,
            } => PhotoRef {
                url,
                key,
                uploaded_at,
            },
        }
    }
}

impl PhotoRef {
    pub fn from_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            key: None,
            uploaded_at: None,
        }
    }
}

/// Profile fields collected during onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub gender: Option<Gender>,
    /// Date of birth as YYYY-MM-DD.
    pub dob: Option<String>,
    /// Age derived from the date of birth at submission time.
    pub age: Option<i64>,
    pub interests: Vec<String>,
    pub photos: Vec<PhotoRef>,
    /// Free-form location object; written by clients, never interpreted here.
    pub location: Option<serde_json::Value>,
}

impl Profile {
    /// Display name resolved from the profile, falling back to the identity
    /// snapshot.
    pub fn display_name(&self, identity: &IdentitySnapshot) -> String {
        let first = self
            .first_name
            .as_deref()
            .or(identity.first_name.as_deref())
            .unwrap_or("")
            .trim();
        let last = self
            .last_name
            .as_deref()
            .or(identity.last_name.as_deref())
            .unwrap_or("")
            .trim();
        format!("{} {}", first, last).trim().to_string()
    }

    pub fn photo_urls(&self) -> Vec<String> {
        self.photos.iter().map(|p| p.url.clone()).collect()
    }
}

/// Snapshot of the external identity provider's view of the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentitySnapshot {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    /// Provider-side creation time, epoch milliseconds.
    pub created_at: Option<i64>,
}

/// User entity assembled from a database row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub identity: IdentitySnapshot,
    pub profile: Profile,
    pub onboarding: OnboardingState,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing)]
    pub deleted_at: Option<String>,
}

/// Raw database row; embedded objects are JSON text columns.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub identity: Option<String>,
    pub profile: Option<String>,
    pub onboarding: Option<String>,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

fn parse_embedded<T: serde::de::DeserializeOwned + Default>(raw: Option<&str>) -> T {
    raw.filter(|s| !s.is_empty())
        .map(|s| serde_json::from_str(s).unwrap_or_default())
        .unwrap_or_default()
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            identity: parse_embedded(row.identity.as_deref()),
            profile: parse_embedded(row.profile.as_deref()),
            onboarding: parse_embedded(row.onboarding.as_deref()),
            id: row.id,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Profile subset exposed by the lookup and profile endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user_id: String,
    pub name: String,
    pub about: String,
    pub interests: Vec<String>,
    pub photos: Vec<String>,
    pub onboarding: OnboardingState,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        let name = user.profile.display_name(&user.identity);
        Self {
            user_id: user.id.clone(),
            name: if name.is_empty() {
                "Your Name".to_string()
            } else {
                name
            },
            about: user.profile.about.clone().unwrap_or_default(),
            interests: user.profile.interests.clone(),
            photos: user.profile.photo_urls(),
            onboarding: user.onboarding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_round_trip() {
        for raw in ["Male", "Female", "Non-binary", "Prefer not to say", "Other"] {
            let gender: Gender = raw.parse().unwrap();
            assert_eq!(gender.to_string(), raw);
        }
        assert!("male".parse::<Gender>().is_err());
    }

    #[test]
    fn test_photo_ref_accepts_legacy_strings() {
        let photos: Vec<PhotoRef> = serde_json::from_str(
            r#"["https://cdn.test/a.jpg", {"url": "https://cdn.test/b.jpg", "key": "k2"}]"#,
        )
        .unwrap();
        assert_eq!(photos[0].url, "https://cdn.test/a.jpg");
        assert_eq!(photos[0].key, None);
        assert_eq!(photos[1].key.as_deref(), Some("k2"));
    }

    #[test]
    fn test_display_name_falls_back_to_identity() {
        let identity = IdentitySnapshot {
            first_name: Some("Grace".to_string()),
            last_name: Some("Hopper".to_string()),
            ..Default::default()
        };
        let mut profile = Profile::default();
        assert_eq!(profile.display_name(&identity), "Grace Hopper");

        profile.first_name = Some("Amazing".to_string());
        assert_eq!(profile.display_name(&identity), "Amazing Hopper");
    }

    #[test]
    fn test_profile_tolerates_corrupt_json() {
        let row = UserRow {
            id: "user-1".to_string(),
            identity: Some("{not json".to_string()),
            profile: Some("".to_string()),
            onboarding: Some(r#"{"step":"gender","completed":false}"#.to_string()),
            is_deleted: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            deleted_at: None,
        };
        let user: User = row.into();
        assert_eq!(user.identity, IdentitySnapshot::default());
        assert_eq!(user.profile, Profile::default());
        assert_eq!(
            user.onboarding.step,
            crate::onboarding::OnboardingStep::Gender
        );
    }
}
