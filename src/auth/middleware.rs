use crate::auth::jwt::JwtManager;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Caller identity resolved from a bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

/// Bearer token from the `Authorization` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Attach a [`Principal`] to the request when it carries a valid token.
///
/// Never rejects. Handlers that require a user enforce that themselves, and
/// the rate limiters downstream read the principal to pick a key.
pub async fn resolve_identity(
    State(jwt): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = bearer_token(request.headers()).and_then(|token| {
        match jwt
            .validate_access_token(token)
            .and_then(|claims| claims.user_id())
        {
            Ok(user_id) => Some(Principal { user_id }),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                None
            }
        }
    });

    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use axum::{
        body::Body,
        http::{HeaderValue, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn jwt() -> Arc<JwtManager> {
        Arc::new(
            JwtManager::new(&AuthConfig {
                jwt_secret: "test-secret-key-for-jwt-signing-minimum-length".to_string(),
                ..AuthConfig::default()
            })
            .unwrap(),
        )
    }

    fn app(jwt: Arc<JwtManager>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|principal: Option<Extension<Principal>>| async move {
                    match principal {
                        Some(Extension(p)) => p.user_id.to_string(),
                        None => "anonymous".to_string(),
                    }
                }),
            )
            .layer(from_fn_with_state(jwt, resolve_identity))
    }

    async fn whoami(app: Router, authorization: Option<String>) -> String {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_valid_token_sets_principal() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();
        let token = jwt.generate_access_token(user_id).unwrap();

        let body = whoami(app(jwt), Some(format!("Bearer {}", token))).await;
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_invalid_token_passes_through_anonymous() {
        let body = whoami(app(jwt()), Some("Bearer not-a-jwt".to_string())).await;
        assert_eq!(body, "anonymous");

        let body = whoami(app(jwt()), None).await;
        assert_eq!(body, "anonymous");
    }
}
