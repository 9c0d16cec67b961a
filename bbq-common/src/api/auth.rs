//! Caller identity and role guards
//!
//! # Architecture
//!
//! Sessions are owned by the external identity provider. Its gateway
//! authenticates the browser session and forwards the result on every
//! request as two headers:
//! - `x-bbq-user-id`: the provider's user id (absent when unauthenticated)
//! - `x-bbq-user-role`: the role from the session's public metadata
//!
//! This module only interprets those values. Blank header values count as
//! absent.

use thiserror::Error;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-bbq-user-id";

/// Header carrying the caller's role claim
pub const USER_ROLE_HEADER: &str = "x-bbq-user-role";

/// Role required for administrative endpoints
pub const ADMIN_ROLE: &str = "admin";

/// Access guard failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No authenticated user on the request
    #[error("Unauthorized")]
    Unauthenticated,

    /// Authenticated, but the role does not allow the operation
    #[error("Forbidden")]
    Forbidden { user_id: String },
}

/// Identity of the caller as forwarded by the identity gateway
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

impl Caller {
    /// Build from raw header values
    pub fn from_header_values(user_id: Option<&str>, role: Option<&str>) -> Self {
        Self {
            user_id: non_blank(user_id),
            role: non_blank(role),
        }
    }

    /// Caller used when auth is configured off
    pub fn trusted() -> Self {
        Self {
            user_id: Some("local".to_string()),
            role: Some(ADMIN_ROLE.to_string()),
        }
    }

    /// Any authenticated caller
    pub fn require_user(&self) -> Result<&str, AccessError> {
        self.user_id.as_deref().ok_or(AccessError::Unauthenticated)
    }

    /// Authenticated caller holding the admin role
    pub fn require_admin(&self) -> Result<&str, AccessError> {
        let user_id = self.require_user()?;
        if self.role.as_deref() != Some(ADMIN_ROLE) {
            return Err(AccessError::Forbidden {
                user_id: user_id.to_string(),
            });
        }
        Ok(user_id)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
