//! Reqwest client for the upstream identity provider.
//!
//! The upstream owns persistence, password verification, and the OAuth
//! handshake; this client only maps its HTTP surface onto the two flow
//! boundaries. Provider rejections (4xx) carry a user-facing message and
//! become [`AuthError::Rejected`]; transport failures and 5xx become
//! [`AuthError::Unavailable`].

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::flow::bridge::{AuthError, AuthResult, IdentityBridge, Provider, SocialRedirect};
use crate::flow::session::{extract_session_token, Session, SessionStore, StoreError, UserProfile};
use crate::APP_USER_AGENT;

#[derive(Serialize, Debug)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Serialize, Debug)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize, Debug)]
struct SocialRequest<'a> {
    provider: &'a str,
    #[serde(rename = "callbackURL")]
    callback_url: &'a str,
}

/// Session payload returned by the upstream on sign-in and session reads.
#[derive(Deserialize, Debug)]
struct SessionEnvelope {
    token: String,
    user: UserProfile,
}

#[derive(Deserialize, Debug)]
struct SocialResponse {
    url: String,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    message: String,
}

/// HTTP client implementing both collaborator boundaries against one
/// upstream identity provider.
pub struct IdpClient {
    base: Url,
    client: Client,
}

impl IdpClient {
    /// Build a client for the provider rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url.trim_end_matches('/'))?;
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        // The base is validated at construction; a join only fails on a
        // malformed path.
        self.base
            .join(&format!("{}/{path}", self.base.path().trim_end_matches('/')))
            .map_err(|err| AuthError::Unavailable(format!("invalid endpoint {path}: {err}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        request
            .send()
            .await
            .map_err(|err| AuthError::Unavailable(err.to_string()))
    }

    async fn session_from(&self, response: Response) -> AuthResult {
        let status = response.status();
        if status.is_success() {
            let envelope: SessionEnvelope = response
                .json()
                .await
                .map_err(|err| AuthError::Unavailable(format!("malformed session: {err}")))?;
            return Ok(Session::new(envelope.token, envelope.user));
        }
        let body = response.text().await.unwrap_or_default();
        Err(auth_error_from_parts(status, &body))
    }
}

/// Map a non-success upstream response onto the failure taxonomy.
fn auth_error_from_parts(status: StatusCode, body: &str) -> AuthError {
    if status.is_client_error() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|err| err.message)
            .unwrap_or_else(|_| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "Authentication failed".to_string()
                } else {
                    trimmed.to_string()
                }
            });
        AuthError::Rejected(message)
    } else {
        AuthError::Unavailable(format!("identity provider answered {status}"))
    }
}

#[async_trait]
impl SessionStore for IdpClient {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, StoreError> {
        // No token means no session; the upstream is not consulted.
        let Some(token) = extract_session_token(headers) else {
            return Ok(None);
        };

        let url = self
            .endpoint("session")
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if status.is_success() {
            let envelope: SessionEnvelope = response
                .json()
                .await
                .map_err(|err| StoreError::Unavailable(format!("malformed session: {err}")))?;
            return Ok(Some(Session::new(envelope.token, envelope.user)));
        }
        Err(StoreError::Unavailable(format!(
            "identity provider answered {status}"
        )))
    }
}

#[async_trait]
impl IdentityBridge for IdpClient {
    async fn sign_up(&self, email: &str, password: &SecretString, name: &str) -> AuthResult {
        let url = self.endpoint("sign-up/email")?;
        let payload = SignUpRequest {
            email,
            password: password.expose_secret(),
            name,
        };
        let response = self.send(self.client.post(url).json(&payload)).await?;
        self.session_from(response).await
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> AuthResult {
        let url = self.endpoint("sign-in/email")?;
        let payload = SignInRequest {
            email,
            password: password.expose_secret(),
        };
        let response = self.send(self.client.post(url).json(&payload)).await?;
        self.session_from(response).await
    }

    async fn sign_in_social(
        &self,
        provider: &Provider,
        callback: &str,
    ) -> Result<SocialRedirect, AuthError> {
        let url = self.endpoint("sign-in/social")?;
        let payload = SocialRequest {
            provider: provider.as_slug(),
            callback_url: callback,
        };
        let response = self.send(self.client.post(url).json(&payload)).await?;
        let status = response.status();
        if status.is_success() {
            let redirect: SocialResponse = response
                .json()
                .await
                .map_err(|err| AuthError::Unavailable(format!("malformed redirect: {err}")))?;
            return Ok(SocialRedirect { url: redirect.url });
        }
        let body = response.text().await.unwrap_or_default();
        Err(auth_error_from_parts(status, &body))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("sign-out")?;
        let response = self.send(self.client.post(url).bearer_auth(token)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(auth_error_from_parts(status, &body))
    }
}
