//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Which identity source requests are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityMode {
    /// End-user sessions: `Authorization: Bearer <JWT>`.
    #[default]
    Session,
    /// Trusted service callers: `x-api-key` plus an explicit `userId`
    /// parameter per request.
    SharedSecret,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity resolution mode.
    pub mode: IdentityMode,

    /// JWT secret for HS256 session tokens. Supports `env:VAR_NAME` syntax.
    /// REQUIRED in session mode.
    pub jwt_secret: Option<String>,

    /// Shared secret expected in the `x-api-key` header. Supports
    /// `env:VAR_NAME` syntax. REQUIRED in shared-secret mode; also guards
    /// the identity-sync webhook in either mode.
    pub api_key: Option<String>,

    /// Allowed CORS origins.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Session,
            // No default secrets - must be explicitly configured
            jwt_secret: None,
            api_key: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        resolve_secret(self.jwt_secret.as_deref())
    }

    /// Resolve the shared service key, expanding `env:VAR_NAME` syntax.
    pub fn resolve_api_key(&self) -> Result<Option<String>, ConfigValidationError> {
        resolve_secret(self.api_key.as_deref())
    }

    /// Validate the configuration for the selected mode.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        match self.mode {
            IdentityMode::Session => {
                let secret = self
                    .resolve_jwt_secret()?
                    .ok_or(ConfigValidationError::MissingJwtSecret)?;
                if secret.len() < 32 {
                    return Err(ConfigValidationError::JwtSecretTooShort);
                }
            }
            IdentityMode::SharedSecret => {
                if self.resolve_api_key()?.is_none() {
                    return Err(ConfigValidationError::MissingApiKey);
                }
            }
        }
        Ok(())
    }
}

fn resolve_secret(value: Option<&str>) -> Result<Option<String>, ConfigValidationError> {
    match value {
        None => Ok(None),
        Some(value) => {
            if let Some(var_name) = value.strip_prefix("env:") {
                match std::env::var(var_name) {
                    Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                    Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                    Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                }
            } else {
                Ok(Some(value.to_string()))
            }
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// JWT secret is required in session mode.
    MissingJwtSecret,
    /// JWT secret is too short (minimum 32 characters).
    JwtSecretTooShort,
    /// Shared service key is required in shared-secret mode.
    MissingApiKey,
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => write!(
                f,
                "jwt_secret is required in session mode. Set it in config or via env: syntax."
            ),
            Self::JwtSecretTooShort => {
                write!(f, "jwt_secret must be at least 32 characters")
            }
            Self::MissingApiKey => write!(
                f,
                "api_key is required in shared-secret mode. Set it in config or via env: syntax."
            ),
            Self::EnvVarNotFound(name) => {
                write!(f, "environment variable {} not found", name)
            }
            Self::EnvVarEmpty(name) => {
                write!(f, "environment variable {} is empty", name)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_mode_requires_long_secret() {
        let config = AuthConfig {
            jwt_secret: Some("short".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::JwtSecretTooShort)
        );

        let config = AuthConfig {
            jwt_secret: Some("a".repeat(32)),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shared_secret_mode_requires_api_key() {
        let config = AuthConfig {
            mode: IdentityMode::SharedSecret,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::MissingApiKey));
    }

    #[test]
    fn test_env_syntax() {
        // Safety: test-only process-local env mutation.
        unsafe { std::env::set_var("GATHER_TEST_SECRET", "super-secret-value-with-length") };
        let config = AuthConfig {
            jwt_secret: Some("env:GATHER_TEST_SECRET".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_jwt_secret().unwrap().as_deref(),
            Some("super-secret-value-with-length")
        );

        let config = AuthConfig {
            jwt_secret: Some("env:GATHER_TEST_MISSING".to_string()),
            ..Default::default()
        };
        assert!(config.resolve_jwt_secret().is_err());
    }
}
