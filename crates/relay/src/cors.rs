// CORS middleware configuration for the relay server.
//
// The allowed origin list comes from `RelayConfig::frontend_origins`. The
// default `"*"` lets any browser origin connect, which is only suitable for
// development; production deployments set the frontend URL.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build a [`CorsLayer`] for the configured origins.
///
/// - `"*"` allows any origin without credentials.
/// - A comma-separated list allows exactly those origins, with credentials.
pub fn cors_layer(origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(std::time::Duration::from_secs(3600));

    match origins.trim() {
        "*" => base.allow_origin(AllowOrigin::any()),
        list => base.allow_origin(parse_origins(list)).allow_credentials(true),
    }
}

fn parse_origins(comma_separated: &str) -> Vec<HeaderValue> {
    comma_separated
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, response::IntoResponse, routing::get, Router};
    use tower::ServiceExt;

    async fn ok_handler() -> impl IntoResponse {
        "ok"
    }

    fn test_app(origins: &str) -> Router {
        Router::new().route("/test", get(ok_handler)).layer(cors_layer(origins))
    }

    fn preflight(origin: &str, method: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/test")
            .header("origin", origin)
            .header("access-control-request-method", method)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin_without_credentials() {
        let response =
            test_app("*").oneshot(preflight("https://anything.example.com", "GET")).await.unwrap();

        assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
        assert!(response.headers().get("access-control-allow-credentials").is_none());
    }

    #[tokio::test]
    async fn configured_origin_is_echoed_with_credentials() {
        let response = test_app("https://chat.example.com")
            .oneshot(preflight("https://chat.example.com", "DELETE"))
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://chat.example.com"
        );
        assert_eq!(response.headers().get("access-control-allow-credentials").unwrap(), "true");
    }

    #[tokio::test]
    async fn unknown_origin_is_rejected_when_restricted() {
        let response = test_app("https://chat.example.com")
            .oneshot(preflight("https://evil.example.com", "DELETE"))
            .await
            .unwrap();

        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn max_age_is_set() {
        let response =
            test_app("*").oneshot(preflight("http://localhost:5173", "GET")).await.unwrap();

        assert_eq!(response.headers().get("access-control-max-age").unwrap(), "3600");
    }

    #[test]
    fn parse_origins_handles_whitespace() {
        let origins = parse_origins("  https://a.com , https://b.com  , ");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://a.com");
        assert_eq!(origins[1], "https://b.com");
    }
}
