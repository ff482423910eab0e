//! Identity resolution middleware.
//!
//! Two identity sources exist: end-user sessions carrying a Bearer JWT, and
//! trusted service callers carrying a shared `x-api-key` plus an explicit
//! `userId` per request. Both are modeled behind [`IdentityResolver`]; the
//! active implementation is selected by configuration.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AuthConfig, AuthError, IdentityMode};

/// JWT claims carried by session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Expiry, unix seconds.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The identity a request acts with.
#[derive(Debug, Clone)]
pub enum CallerIdentity {
    /// An authenticated end-user session.
    Session { user_id: String },
    /// A trusted service caller; the acting user is named per request.
    Service,
}

impl CallerIdentity {
    /// Resolve the user this request acts on behalf of.
    ///
    /// Sessions act as themselves and ignore any explicit id; service
    /// callers must supply one.
    pub fn subject(&self, explicit: Option<&str>) -> Result<String, AuthError> {
        match self {
            CallerIdentity::Session { user_id } => Ok(user_id.clone()),
            CallerIdentity::Service => explicit
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or(AuthError::MissingSubject),
        }
    }
}

/// Resolve a caller identity from request headers.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError>;
}

/// Extract a Bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() || parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Session JWT resolver.
pub struct SessionResolver {
    decoding_key: DecodingKey,
}

impl SessionResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear(); // Allow missing iss/aud

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                warn!("JWT validation failed: {:?}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

impl IdentityResolver for SessionResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError> {
        let header_value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let claims = self.validate_token(bearer_token_from_header(header_value)?)?;
        Ok(CallerIdentity::Session {
            user_id: claims.sub,
        })
    }
}

/// Shared-secret resolver for trusted service callers.
pub struct SharedSecretResolver {
    api_key: String,
}

impl SharedSecretResolver {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
        }
    }
}

impl IdentityResolver for SharedSecretResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError> {
        let presented = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented.is_empty() || presented != self.api_key {
            return Err(AuthError::InvalidApiKey);
        }
        Ok(CallerIdentity::Service)
    }
}

/// Authentication state shared across handlers.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
    resolver: Arc<dyn IdentityResolver>,
    api_key: Option<String>,
    encoding_secret: Option<String>,
}

impl AuthState {
    /// Create auth state from validated config. Resolves `env:VAR_NAME`
    /// secrets at construction time.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let jwt_secret = config
            .resolve_jwt_secret()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let api_key = config
            .resolve_api_key()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let resolver: Arc<dyn IdentityResolver> = match config.mode {
            IdentityMode::Session => {
                let secret = jwt_secret
                    .as_deref()
                    .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;
                Arc::new(SessionResolver::new(secret))
            }
            IdentityMode::SharedSecret => {
                let key = api_key
                    .as_deref()
                    .ok_or_else(|| AuthError::Internal("no api key configured".to_string()))?;
                Arc::new(SharedSecretResolver::new(key))
            }
        };

        Ok(Self {
            config: Arc::new(config),
            resolver,
            api_key,
            encoding_secret: jwt_secret,
        })
    }

    /// Get allowed CORS origins from config.
    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    /// Resolve the caller identity for a request.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError> {
        self.resolver.resolve(headers)
    }

    /// Check the shared service key directly. Guards the identity-sync
    /// webhook regardless of the active identity mode.
    pub fn verify_service_key(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let expected = self
            .api_key
            .as_deref()
            .ok_or_else(|| AuthError::Internal("no api key configured".to_string()))?;
        let presented = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented.is_empty() || presented != expected {
            return Err(AuthError::InvalidApiKey);
        }
        Ok(())
    }

    /// Mint a session token, for local tooling and tests.
    pub fn generate_token(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<String, AuthError> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let secret = self
            .encoding_secret
            .as_deref()
            .ok_or_else(|| AuthError::Internal("no JWT secret configured".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: Utc::now().timestamp() + 3600 * 24, // 24 hours
            iat: Some(Utc::now().timestamp()),
            email: email.map(str::to_string),
            name: name.map(str::to_string),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

/// Middleware resolving the caller identity and storing it in request
/// extensions for the [`CurrentIdentity`] extractor.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    match auth.resolve(req.headers()) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// Resolved identity extracted from request extensions.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub CallerIdentity);

impl CurrentIdentity {
    pub fn subject(&self, explicit: Option<&str>) -> Result<String, AuthError> {
        self.0.subject(explicit)
    }
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AuthError::MissingAuthHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_state() -> AuthState {
        AuthState::new(AuthConfig {
            jwt_secret: Some("unit-test-secret-with-enough-length".to_string()),
            api_key: Some("svc-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn secret_state() -> AuthState {
        AuthState::new(AuthConfig {
            mode: IdentityMode::SharedSecret,
            api_key: Some("svc-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token_from_header("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_token_from_header("bearer abc").unwrap(), "abc");
        assert!(bearer_token_from_header("Basic abc").is_err());
        assert!(bearer_token_from_header("Bearer").is_err());
        assert!(bearer_token_from_header("Bearer a b").is_err());
    }

    #[test]
    fn test_session_round_trip() {
        let state = session_state();
        let token = state
            .generate_token("user-1", Some("a@example.com"), Some("Ada"))
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());

        let identity = state.resolve(&headers).unwrap();
        assert!(matches!(
            identity,
            CallerIdentity::Session { ref user_id } if user_id == "user-1"
        ));
        assert_eq!(identity.subject(Some("other")).unwrap(), "user-1");
    }

    #[test]
    fn test_session_rejects_garbage() {
        let state = session_state();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            state.resolve(&headers),
            Err(AuthError::MissingAuthHeader)
        ));

        headers.insert(AUTHORIZATION, "Bearer not-a-jwt".parse().unwrap());
        assert!(matches!(
            state.resolve(&headers),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_shared_secret_requires_subject() {
        let state = secret_state();
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "svc-key".parse().unwrap());

        let identity = state.resolve(&headers).unwrap();
        assert!(matches!(identity, CallerIdentity::Service));
        assert_eq!(identity.subject(Some(" user-9 ")).unwrap(), "user-9");
        assert!(matches!(
            identity.subject(None),
            Err(AuthError::MissingSubject)
        ));
        assert!(matches!(
            identity.subject(Some("  ")),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_shared_secret_rejects_wrong_key() {
        let state = secret_state();
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "wrong".parse().unwrap());
        assert!(matches!(
            state.resolve(&headers),
            Err(AuthError::InvalidApiKey)
        ));
    }

    #[test]
    fn test_verify_service_key_in_session_mode() {
        let state = session_state();
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "svc-key".parse().unwrap());
        assert!(state.verify_service_key(&headers).is_ok());

        headers.insert("x-api-key", "nope".parse().unwrap());
        assert!(state.verify_service_key(&headers).is_err());
    }
}
