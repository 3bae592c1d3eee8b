//! # Gatehouse (Session-Gated Authentication Front)
//!
//! `gatehouse` puts a small set of HTML surfaces behind server-side session
//! checks and mediates credential submission to an upstream identity
//! provider.
//!
//! ## Route gating
//!
//! Every page declares a policy: protected pages require a session and send
//! anonymous callers to the sign-in surface; the sign-in and sign-up pages
//! require the opposite and send authenticated callers away. The decision is
//! made before any view logic runs, so protected markup is never sent to an
//! anonymous caller, not even transiently.
//!
//! ## Authentication flow
//!
//! Credential submission is driven by a per-form state machine
//! (`flow::form::CredentialForm`): field edits are free, a submit validates
//! locally before anything leaves the process, and at most one request per
//! form may be outstanding. Social sign-in shares the same pending flag and
//! hands off to the provider via redirect.
//!
//! ## Collaborators
//!
//! Sessions, password verification, and the OAuth handshake all live in the
//! upstream identity provider, consumed through two traits
//! (`flow::session::SessionStore`, `flow::bridge::IdentityBridge`). This
//! crate stores nothing and only observes session state.

pub mod api;
pub mod cli;
pub mod flow;
pub mod idp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
