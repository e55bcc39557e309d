//! Caller identity from the `X-User-Id` / `X-User-Role` headers, and the
//! role gates built on it.
//!
//! The headers are set by whatever authenticates the caller upstream. A
//! request without both headers, or with an unknown role, is anonymous.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use campus_core::enums::Role;
use campus_core::permissions::authorize;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let user_id = header(USER_ID_HEADER)?;
        let role = header(USER_ROLE_HEADER)?.parse::<Role>().ok()?;
        Some(Self {
            user_id: user_id.to_string(),
            role,
        })
    }

    /// The caller id as an audit actor.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }

    fn require(self, role: Role, message: &str) -> Result<Self, AppError> {
        if authorize(role, self.role) {
            Ok(self)
        } else {
            tracing::debug!(
                user_id = %self.user_id,
                role = %self.role,
                required = %role,
                "role gate denied"
            );
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(AppError::Unauthorized)
    }
}

/// Identity when present, for public routes that tailor their answer.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeIdentity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Identity::from_headers(&parts.headers)))
    }
}

/// Admin-only routes.
#[derive(Debug, Clone)]
pub struct Admin(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        identity.require(Role::Admin, "Admin access required").map(Self)
    }
}

/// Trainer routes. Admins pass too.
#[derive(Debug, Clone)]
pub struct Trainer(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Trainer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        identity.require(Role::Trainer, "Trainer access required").map(Self)
    }
}

/// Student routes. Admins pass too.
#[derive(Debug, Clone)]
pub struct Student(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Student {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        identity.require(Role::Student, "Student access required").map(Self)
    }
}
