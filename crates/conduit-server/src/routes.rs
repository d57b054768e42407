//! Router assembly.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::connect::connect;
use crate::negotiate::negotiate;
use crate::state::ServerState;

/// Build the full router: connection endpoints, health, metrics, and the
/// optional static asset tree under `/public`.
pub fn router(state: Arc<ServerState>, static_root: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/{endpoint}/negotiate", get(negotiate))
        .route("/{endpoint}/connect", get(connect))
        .with_state(state);

    if let Some(root) = static_root {
        router = router.nest_service(
            "/public",
            ServeDir::new(root).append_index_html_on_directories(true),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<Arc<ServerState>>) -> Response {
    match state.metrics_handle() {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use conduit_broker::MessageBroker;
    use std::io::Write;
    use tower::ServiceExt;

    fn test_state() -> Arc<ServerState> {
        Arc::new(ServerState::new(Arc::new(MessageBroker::new())).map_plain_connection("raw"))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = router(test_state(), None);
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn negotiate_returns_identity_and_url() {
        let app = router(test_state(), None);
        let response = app
            .oneshot(Request::get("/raw/negotiate").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert!(!body["connectionId"].as_str().unwrap().is_empty());
        assert_eq!(body["url"], "/raw/connect");
    }

    #[tokio::test]
    async fn negotiate_unknown_endpoint_is_404() {
        let app = router(test_state(), None);
        let response = app
            .oneshot(
                Request::get("/missing/negotiate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let app = router(test_state(), None);
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn static_assets_are_served() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("index.html")).unwrap();
        writeln!(file, "<html>raw sample</html>").unwrap();

        let app = router(test_state(), Some(dir.path()));
        let response = app
            .oneshot(
                Request::get("/public/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(content_type.starts_with("text/html"));
        assert!(body_string(response).await.contains("raw sample"));
    }

    #[tokio::test]
    async fn missing_static_asset_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(), Some(dir.path()));
        let response = app
            .oneshot(
                Request::get("/public/nope.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
