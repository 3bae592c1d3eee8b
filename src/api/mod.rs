//! HTTP surface: router, layers, and server startup.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{auth, health, pages};
use crate::flow::bridge::IdentityBridge;
use crate::flow::session::SessionStore;

pub(crate) mod handlers;
mod openapi;
pub(crate) mod views;

pub use handlers::auth::AuthConfig;
pub use openapi::ApiDoc;

/// Build the application router with the gated pages, the auth surface, and
/// the ambient layers.
#[must_use]
pub fn router(
    store: Arc<dyn SessionStore>,
    bridge: Arc<dyn IdentityBridge>,
    auth_config: AuthConfig,
) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/sign-in", get(pages::sign_in))
        .route("/sign-up", get(pages::sign_up))
        .route("/health", get(health::health))
        .route("/v1/auth/sign-in", post(auth::sign_in))
        .route("/v1/auth/sign-up", post(auth::sign_up))
        .route("/v1/auth/sign-out", post(auth::sign_out))
        .route("/v1/auth/session", get(auth::session))
        .route("/v1/auth/social/{provider}", get(auth::social))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(store))
                .layer(Extension(bridge))
                .layer(Extension(Arc::new(auth_config))),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    store: Arc<dyn SessionStore>,
    bridge: Arc<dyn IdentityBridge>,
    auth_config: AuthConfig,
) -> Result<()> {
    let app = router(store, bridge, auth_config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
