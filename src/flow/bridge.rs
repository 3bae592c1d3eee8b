//! Identity provider bridge boundary and the auth request/result protocol.
//!
//! Everything that can verify a password or talk to an OAuth provider lives
//! behind [`IdentityBridge`]. The flow core only produces [`AuthRequest`]s
//! and consumes tagged results; it never sees provider mechanics.

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

use crate::flow::session::Session;

/// Social identity provider. Open set: known providers get a variant,
/// anything else passes through by slug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Google,
    GitHub,
    Other(String),
}

impl Provider {
    /// Parse a provider slug as it appears in URLs.
    #[must_use]
    pub fn parse(slug: &str) -> Self {
        match slug.trim().to_lowercase().as_str() {
            "google" => Provider::Google,
            "github" => Provider::GitHub,
            other => Provider::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_slug(&self) -> &str {
        match self {
            Provider::Google => "google",
            Provider::GitHub => "github",
            Provider::Other(slug) => slug,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_slug())
    }
}

/// Transient credentials for one submission. Never persisted; the password
/// is redacted from `Debug` output.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
    /// Present only on registration.
    pub name: Option<String>,
}

/// One request to the identity provider bridge.
#[derive(Clone, Debug)]
pub enum AuthRequest {
    EmailPassword(Credentials),
    Social { provider: Provider, callback: String },
}

/// Why an auth request did not produce a session.
#[derive(Clone, Debug)]
pub enum AuthError {
    /// The provider rejected the attempt (bad credentials, duplicate
    /// account). The message is shown to the user verbatim.
    Rejected(String),
    /// The provider could not be reached or answered out of contract. The
    /// detail is for logs; users get a generic message.
    Unavailable(String),
}

impl AuthError {
    /// The message a form surfaces for this failure.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            AuthError::Rejected(message) => message,
            AuthError::Unavailable(_) => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Rejected(message) => write!(formatter, "Rejected: {message}"),
            AuthError::Unavailable(detail) => {
                write!(formatter, "Identity provider unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Result of exactly one auth request. Never partially applied: either a
/// full session or a tagged failure.
pub type AuthResult = Result<Session, AuthError>;

/// Provider authorize handoff returned by the social path. The caller must
/// navigate to `url`; no session is returned on this path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialRedirect {
    pub url: String,
}

/// Write boundary to the identity provider.
#[async_trait]
pub trait IdentityBridge: Send + Sync {
    /// Register an account. Registration does not auto-authenticate in this
    /// flow; callers ignore the returned session.
    async fn sign_up(&self, email: &str, password: &SecretString, name: &str) -> AuthResult;

    /// Verify email/password credentials.
    async fn sign_in(&self, email: &str, password: &SecretString) -> AuthResult;

    /// Start a provider-redirect flow. The result of the flow itself is
    /// observed through subsequent session reads, not returned here.
    async fn sign_in_social(
        &self,
        provider: &Provider,
        callback: &str,
    ) -> Result<SocialRedirect, AuthError>;

    /// Invalidate the session behind `token`.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}
