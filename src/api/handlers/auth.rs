//! Auth endpoints: credential submission, social handoff, session reads,
//! sign-out, and the session cookie.

use axum::{
    extract::{Extension, Form, Path, Query},
    http::{
        header::{InvalidHeaderValue, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use utoipa::ToSchema;

use crate::api::views;
use crate::flow::bridge::{IdentityBridge, Provider};
use crate::flow::form::{CredentialForm, Resolution};
use crate::flow::gate::{HOME_PATH, SIGN_IN_PATH};
use crate::flow::session::{extract_session_token, SessionStore, SESSION_COOKIE_NAME};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;
const DEFAULT_SUBMIT_TIMEOUT_SECONDS: u64 = 30;

/// Auth surface configuration.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    public_base_url: String,
    session_ttl_seconds: i64,
    submit_timeout_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        Self {
            public_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            submit_timeout_seconds: DEFAULT_SUBMIT_TIMEOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_submit_timeout_seconds(mut self, seconds: u64) -> Self {
        self.submit_timeout_seconds = seconds;
        self
    }

    /// Bound on one bridge call; a hung provider resolves the submission
    /// instead of pinning the form in pending.
    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_seconds)
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct SocialQuery {
    /// Where the provider sends the user after the handshake.
    pub callback: Option<String>,
}

#[utoipa::path(
    post,
    path = "/v1/auth/sign-in",
    request_body(content = SignInForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in; session cookie set, redirected home"),
        (status = 200, description = "Submission failed; form re-rendered with the error")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    bridge: Extension<Arc<dyn IdentityBridge>>,
    config: Extension<Arc<AuthConfig>>,
    Form(payload): Form<SignInForm>,
) -> Response {
    let mut form = CredentialForm::sign_in();
    form.set_email(&payload.email);
    form.set_password(SecretString::from(payload.password));

    match form.submit(&**bridge, config.submit_timeout()).await {
        Ok(Resolution::Redirect { target, session }) => {
            let mut headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(&config, session.token()) {
                headers.insert(SET_COOKIE, cookie);
            }
            (headers, Redirect::to(target)).into_response()
        }
        // Validation and bridge failures both land back on the form with
        // the submit control enabled again.
        Ok(Resolution::Stay) | Err(_) => Html(views::sign_in_page(
            form.error(),
            form.field_errors(),
            form.email(),
        ))
        .into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/sign-up",
    request_body(content = SignUpForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created; redirected to the sign-in surface"),
        (status = 200, description = "Submission failed; form re-rendered with the error")
    ),
    tag = "auth"
)]
pub async fn sign_up(
    bridge: Extension<Arc<dyn IdentityBridge>>,
    config: Extension<Arc<AuthConfig>>,
    Form(payload): Form<SignUpForm>,
) -> Response {
    let mut form = CredentialForm::sign_up();
    form.set_name(&payload.name);
    form.set_email(&payload.email);
    form.set_password(SecretString::from(payload.password));

    match form.submit(&**bridge, config.submit_timeout()).await {
        // Registration does not auto-authenticate: no cookie is set and the
        // caller lands on the sign-in surface.
        Ok(Resolution::Redirect { target, .. }) => Redirect::to(target).into_response(),
        Ok(Resolution::Stay) | Err(_) => Html(views::sign_up_page(
            form.error(),
            form.field_errors(),
            form.name(),
            form.email(),
        ))
        .into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/social/{provider}",
    params(
        ("provider" = String, Path, description = "Provider slug, e.g. google or github"),
        ("callback" = Option<String>, Query, description = "Post-handshake destination")
    ),
    responses(
        (status = 303, description = "Redirected to the provider authorize URL"),
        (status = 200, description = "Handoff failed; sign-in form re-rendered with the error")
    ),
    tag = "auth"
)]
pub async fn social(
    Path(provider): Path<String>,
    Query(query): Query<SocialQuery>,
    bridge: Extension<Arc<dyn IdentityBridge>>,
    config: Extension<Arc<AuthConfig>>,
) -> Response {
    let provider = Provider::parse(&provider);
    let callback = query.callback.unwrap_or_else(|| HOME_PATH.to_string());

    let mut form = CredentialForm::sign_in();
    match form
        .submit_social(&**bridge, provider, &callback, config.submit_timeout())
        .await
    {
        // The session, if the handshake succeeds, is only ever observed
        // through later session reads.
        Ok(Some(redirect)) => Redirect::to(&redirect.url).into_response(),
        Ok(None) | Err(_) => {
            Html(views::sign_in_page(form.error(), form.field_errors(), "")).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, store: Extension<Arc<dyn SessionStore>>) -> Response {
    match store.get_session(&headers).await {
        Ok(Some(session)) => {
            let user = session.user();
            let response = SessionResponse {
                user_id: user.id.to_string(),
                name: user.name.clone(),
                email: user.email.clone(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to look up session: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/sign-out",
    responses(
        (status = 303, description = "Session cleared; redirected to the sign-in surface")
    ),
    tag = "auth"
)]
pub async fn sign_out(
    headers: HeaderMap,
    bridge: Extension<Arc<dyn IdentityBridge>>,
    config: Extension<Arc<AuthConfig>>,
) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = bridge.sign_out(&token).await {
            error!("Failed to clear upstream session: {err}");
        }
    }

    // Always clear the cookie, even if the upstream call failed.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(&config) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (response_headers, Redirect::to(SIGN_IN_PATH)).into_response()
}

/// Build a secure `HttpOnly` cookie for the session token.
fn session_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
