//! OpenAPI document for the documented endpoints.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::auth::sign_in,
        crate::api::handlers::auth::sign_up,
        crate::api::handlers::auth::social,
        crate::api::handlers::auth::session,
        crate::api::handlers::auth::sign_out,
        crate::api::handlers::health::health,
    ),
    components(schemas(
        crate::api::handlers::auth::SignInForm,
        crate::api::handlers::auth::SignUpForm,
        crate::api::handlers::auth::SessionResponse,
    )),
    tags(
        (name = "auth", description = "Session-gated authentication flow"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_auth_surface() {
        let json = ApiDoc::openapi().to_json().expect("serializable document");
        assert!(json.contains("/v1/auth/sign-in"));
        assert!(json.contains("/v1/auth/sign-up"));
        assert!(json.contains("/v1/auth/session"));
        assert!(json.contains("/v1/auth/sign-out"));
        assert!(json.contains("/health"));
    }
}
