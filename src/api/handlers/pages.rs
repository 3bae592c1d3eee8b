//! Gated HTML surfaces.
//!
//! Each page resolves the session and runs the gate before any view logic,
//! so protected markup is never produced for a caller the policy turns
//! away.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::api::views;
use crate::flow::feed::SessionState;
use crate::flow::form::FieldErrors;
use crate::flow::gate::{guard, GateDecision, RoutePolicy, HOME_PATH, SIGN_IN_PATH};
use crate::flow::session::{verify, Session, SessionStore};

/// Resolve the session or fail the request. A store outage is an
/// infrastructure error, never "unauthenticated".
async fn checked_session(
    store: &dyn SessionStore,
    headers: &HeaderMap,
) -> Result<Option<Session>, Response> {
    verify(store, headers).await.map_err(|err| {
        error!("Session check failed: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Session check failed").into_response()
    })
}

/// `GET /` — protected home surface.
pub async fn home(headers: HeaderMap, store: Extension<Arc<dyn SessionStore>>) -> Response {
    let session = match checked_session(&**store, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match guard(RoutePolicy::RequiresAuth, session.as_ref()) {
        GateDecision::Redirect(target) => Redirect::to(target).into_response(),
        GateDecision::Render => {
            let state =
                session.map_or(SessionState::Unauthenticated, SessionState::Authenticated);
            Html(views::home_page(&state)).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct SignInQuery {
    /// Error echoed after a redirect back to the form.
    error: Option<String>,
}

/// `GET /sign-in` — anonymous-only sign-in surface.
pub async fn sign_in(
    headers: HeaderMap,
    store: Extension<Arc<dyn SessionStore>>,
    Query(query): Query<SignInQuery>,
) -> Response {
    let session = match checked_session(&**store, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match guard(
        RoutePolicy::RequiresAnon {
            authenticated_target: HOME_PATH,
        },
        session.as_ref(),
    ) {
        GateDecision::Redirect(target) => Redirect::to(target).into_response(),
        GateDecision::Render => Html(views::sign_in_page(
            query.error.as_deref(),
            &FieldErrors::default(),
            "",
        ))
        .into_response(),
    }
}

/// `GET /sign-up` — anonymous-only registration surface. Authenticated
/// callers land on the sign-in surface, not home.
pub async fn sign_up(headers: HeaderMap, store: Extension<Arc<dyn SessionStore>>) -> Response {
    let session = match checked_session(&**store, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match guard(
        RoutePolicy::RequiresAnon {
            authenticated_target: SIGN_IN_PATH,
        },
        session.as_ref(),
    ) {
        GateDecision::Redirect(target) => Redirect::to(target).into_response(),
        GateDecision::Render => {
            Html(views::sign_up_page(None, &FieldErrors::default(), "", "")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::session::{StoreError, UserProfile};
    use async_trait::async_trait;
    use axum::http::header::LOCATION;
    use uuid::Uuid;

    struct FixedStore {
        result: Result<Option<Session>, StoreError>,
    }

    #[async_trait]
    impl SessionStore for FixedStore {
        async fn get_session(&self, _headers: &HeaderMap) -> Result<Option<Session>, StoreError> {
            self.result.clone()
        }
    }

    fn store_with(session: Option<Session>) -> Extension<Arc<dyn SessionStore>> {
        Extension(Arc::new(FixedStore {
            result: Ok(session),
        }) as Arc<dyn SessionStore>)
    }

    fn broken_store() -> Extension<Arc<dyn SessionStore>> {
        Extension(Arc::new(FixedStore {
            result: Err(StoreError::Unavailable("down".to_string())),
        }) as Arc<dyn SessionStore>)
    }

    fn session() -> Session {
        Session::new(
            "tok".to_string(),
            UserProfile {
                id: Uuid::new_v4(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            },
        )
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn anonymous_home_redirects_to_sign_in() {
        let response = home(HeaderMap::new(), store_with(None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/sign-in");
    }

    #[tokio::test]
    async fn authenticated_home_renders() {
        let response = home(HeaderMap::new(), store_with(Some(session()))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authenticated_sign_in_redirects_home() {
        let response = sign_in(
            HeaderMap::new(),
            store_with(Some(session())),
            Query(SignInQuery { error: None }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn anonymous_sign_in_renders() {
        let response = sign_in(
            HeaderMap::new(),
            store_with(None),
            Query(SignInQuery { error: None }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authenticated_sign_up_redirects_to_sign_in() {
        let response = sign_up(HeaderMap::new(), store_with(Some(session()))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/sign-in");
    }

    #[tokio::test]
    async fn store_outage_is_an_infrastructure_error() {
        let response = home(HeaderMap::new(), broken_store()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
