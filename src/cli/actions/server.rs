use crate::api::{self, AuthConfig};
use crate::cli::actions::Action;
use crate::flow::{bridge::IdentityBridge, session::SessionStore};
use crate::idp::IdpClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

/// Handle the server action
/// # Errors
/// Returns an error if the configured URLs are invalid or the server fails
/// to start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            idp_url,
            public_url,
            session_ttl_seconds,
            submit_timeout_seconds,
        } => {
            // Validate early so a bad flag fails at startup, not mid-flow.
            Url::parse(&public_url)
                .with_context(|| format!("Invalid public URL: {public_url}"))?;

            let idp = Arc::new(
                IdpClient::new(&idp_url).context("Invalid identity provider URL")?,
            );
            let auth_config = AuthConfig::new(public_url)
                .with_session_ttl_seconds(session_ttl_seconds)
                .with_submit_timeout_seconds(submit_timeout_seconds);

            // One upstream client serves both collaborator boundaries.
            let store: Arc<dyn SessionStore> = idp.clone();
            let bridge: Arc<dyn IdentityBridge> = idp;

            api::new(port, store, bridge, auth_config).await?;
        }
    }

    Ok(())
}
