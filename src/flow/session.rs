//! Session projection and the session store boundary.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Cookie carrying the opaque session token issued upstream.
pub const SESSION_COOKIE_NAME: &str = "gatehouse_session";

/// Read-only identity projection carried by a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Server-issued proof of authenticated identity.
///
/// The token is opaque here; it is only ever echoed back to the session
/// store. A session, if present, resolves to exactly one user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: UserProfile,
}

impl Session {
    #[must_use]
    pub fn new(token: String, user: UserProfile) -> Self {
        Self { token, user }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn user(&self) -> &UserProfile {
        &self.user
    }
}

/// Session store outage. Distinct from "no session": absence is a normal
/// return value, never an error.
#[derive(Clone, Debug)]
pub enum StoreError {
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(detail) => {
                write!(formatter, "Session store unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Read-only boundary to whatever issues and validates sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve the request's credentials into a session, if one exists.
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, StoreError>;
}

/// One-shot session check used by the route gate before rendering.
///
/// # Errors
///
/// Returns `StoreError` only when the store itself is unreachable; a missing
/// session is `Ok(None)`.
pub async fn verify(
    store: &dyn SessionStore,
    headers: &HeaderMap,
) -> Result<Option<Session>, StoreError> {
    store.get_session(headers).await
}

/// Extract the session token from the cookie header, with bearer fallback.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn session_resolves_to_one_user() {
        let user = profile();
        let session = Session::new("tok".to_string(), user.clone());
        assert_eq!(session.token(), "tok");
        assert_eq!(session.user(), &user);
    }

    #[test]
    fn extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; gatehouse_session=abc123; other=1"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("gatehouse_session=tok-2"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok-1".to_string()));
    }

    #[test]
    fn extract_token_missing_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn store_error_displays_detail() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Session store unavailable: connection refused"
        );
    }
}
