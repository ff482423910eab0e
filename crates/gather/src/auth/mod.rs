//! Caller identity resolution.
//!
//! Provides the identity middleware with two resolver implementations:
//! - Session JWT validation (end-user sessions)
//! - Shared-secret service callers with an explicit per-request subject

mod config;
mod error;
mod middleware;

pub use config::{AuthConfig, ConfigValidationError, IdentityMode};
pub use error::AuthError;
pub use middleware::{
    auth_middleware, AuthState, CallerIdentity, Claims, CurrentIdentity, IdentityResolver,
    SessionResolver, SharedSecretResolver,
};
