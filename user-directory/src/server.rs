//! HTTP server with graceful shutdown

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    handlers,
    health,
    middleware::{request_id_layer, request_id_propagation_layer, sensitive_headers_layer},
    state::AppState,
};

/// Routes of the service, bound to its state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/v1/users/{id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .with_state(state)
}

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Wrap the router in the middleware stack
    ///
    /// The last layer added sees the request first, so panic recovery wraps
    /// everything and request ids are assigned before tracing runs.
    pub fn with_middleware(&self, app: Router) -> Router {
        let body_limit = self.config.middleware.body_limit_mb * 1024 * 1024;

        app.layer(self.build_cors_layer())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                http::StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout(),
            ))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(sensitive_headers_layer())
            .layer(request_id_propagation_layer())
            .layer(request_id_layer())
            .layer(CatchPanicLayer::new())
    }

    /// Run the server with the given router until SIGINT or SIGTERM
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let app = self.with_middleware(app);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn log_middleware_config(&self) {
        tracing::info!(
            body_limit_mb = self.config.middleware.body_limit_mb,
            cors_mode = %self.config.middleware.cors_mode,
            timeout_secs = self.config.service.timeout_secs,
            "Middleware: panic recovery, request ids, header masking, compression enabled"
        );
    }

    fn build_cors_layer(&self) -> CorsLayer {
        match self.config.middleware.cors_mode.as_str() {
            "permissive" => CorsLayer::permissive(),
            "restrictive" | "disabled" => CorsLayer::new(),
            other => {
                tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", other);
                CorsLayer::permissive()
            }
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_pool;
    use axum::body::Body;
    use http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        pool: SqlitePool,
    }

    impl TestApp {
        async fn new() -> Self {
            let pool = memory_pool().await;
            let config = Config::default();
            let server = Server::new(config.clone());
            let app = server.with_middleware(router(AppState::new(config, pool.clone())));
            Self { app, pool }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> http::Response<Body> {
            let mut request = Request::builder().method(method).uri(uri);
            let body = match body {
                Some(json) => {
                    request = request.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            self.app
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap()
        }

        async fn create(&self, body: Value) -> Value {
            let response = self.send(Method::POST, "/api/v1/users", Some(body)).await;
            assert_eq!(response.status(), StatusCode::CREATED);
            read_json(response).await
        }

        async fn add_ad(&self, author: i64, published: bool) {
            sqlx::query("INSERT INTO ads (name, author_id, price, is_published) VALUES ('bike', ?, 250, ?)")
                .bind(author)
                .bind(published)
                .execute(&self.pool)
                .await
                .unwrap();
        }
    }

    async fn read_json(response: http::Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_201_with_location() {
        let app = TestApp::new().await;

        let response = app
            .send(
                Method::POST,
                "/api/v1/users",
                Some(json!({
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "username": "ada",
                    "role": "admin",
                    "age": 36,
                    "locations": ["London", "Paris"]
                })),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let body = read_json(response).await;

        assert_eq!(location, format!("/api/v1/users/{}", body["id"]));
        assert_eq!(body["username"], "ada");
        assert_eq!(body["role"], "admin");
        assert_eq!(body["age"], 36);
        assert_eq!(body["locations"], json!(["London", "Paris"]));
    }

    #[tokio::test]
    async fn test_create_defaults_role_to_member() {
        let app = TestApp::new().await;
        let body = app.create(json!({ "username": "grace" })).await;

        assert_eq!(body["role"], "member");
        assert_eq!(body["first_name"], Value::Null);
        assert_eq!(body["locations"], json!([]));
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_404() {
        let app = TestApp::new().await;

        let response = app.send(Method::GET, "/api/v1/users/999", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = read_json(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["code"], "REPOSITORY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_404() {
        let app = TestApp::new().await;
        let response = app.send(Method::GET, "/api/v1/users/abc", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_listing_includes_published_ad_totals() {
        let app = TestApp::new().await;
        let seller = app.create(json!({ "username": "seller" })).await;
        let browser = app.create(json!({ "username": "browser" })).await;
        let seller_id = seller["id"].as_i64().unwrap();

        for published in [true, true, false] {
            app.add_ad(seller_id, published).await;
        }

        let response = app.send(Method::GET, "/api/v1/users", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-total-count"], "2");

        let body = read_json(response).await;
        let listing = body.as_array().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0]["id"], seller["id"]);
        assert_eq!(listing[0]["total_ads"], 2);
        assert_eq!(listing[1]["id"], browser["id"]);
        assert_eq!(listing[1]["total_ads"], 0);
        assert_eq!(listing[1]["username"], "browser");
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let app = TestApp::new().await;

        let response = app.send(Method::GET, "/api/v1/users", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_listing_pages() {
        let app = TestApp::new().await;
        for n in 0..6 {
            app.create(json!({ "username": format!("user{}", n) })).await;
        }

        let response = app.send(Method::GET, "/api/v1/users?page=2", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-total-count"], "6");
        let page = read_json(response).await;
        let names: Vec<&str> = page
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["user4", "user5"]);

        let response = app.send(Method::GET, "/api/v1/users?page=0", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.send(Method::GET, "/api/v1/users?page=x", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_applies_only_present_fields() {
        let app = TestApp::new().await;
        let created = app
            .create(json!({
                "first_name": "Alan",
                "username": "alan",
                "age": 41,
                "locations": ["Manchester"]
            }))
            .await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        let response = app
            .send(Method::PATCH, &uri, Some(json!({ "age": 42, "last_name": null })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["age"], 42);
        assert_eq!(body["first_name"], "Alan");
        assert_eq!(body["username"], "alan");
        assert_eq!(body["locations"], json!(["Manchester"]));
    }

    #[tokio::test]
    async fn test_patch_with_empty_locations_clears_them() {
        let app = TestApp::new().await;
        let created = app
            .create(json!({ "username": "nomad", "locations": ["Oslo", "Rome"] }))
            .await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        let response = app
            .send(Method::PATCH, &uri, Some(json!({ "locations": [] })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["locations"], json!([]));

        let response = app.send(Method::GET, &uri, None).await;
        assert_eq!(read_json(response).await["locations"], json!([]));
    }

    #[tokio::test]
    async fn test_patch_null_username_or_role_is_422() {
        let app = TestApp::new().await;
        let created = app.create(json!({ "username": "kept", "role": "moderator" })).await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        for body in [json!({ "username": null }), json!({ "role": null })] {
            let response = app.send(Method::PATCH, &uri, Some(body)).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }

        let response = app.send(Method::GET, &uri, None).await;
        let body = read_json(response).await;
        assert_eq!(body["username"], "kept");
        assert_eq!(body["role"], "moderator");
    }

    #[tokio::test]
    async fn test_patch_unknown_user_is_404() {
        let app = TestApp::new().await;
        let response = app
            .send(Method::PATCH, "/api/v1/users/77", Some(json!({ "age": 1 })))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_404() {
        let app = TestApp::new().await;
        let created = app.create(json!({ "username": "leaving" })).await;
        let uri = format!("/api/v1/users/{}", created["id"]);

        let response = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());

        let response = app.send(Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = TestApp::new().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"username\": "))
            .unwrap();
        let response = app.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_422() {
        let app = TestApp::new().await;
        let response = app
            .send(
                Method::POST,
                "/api/v1/users",
                Some(json!({ "username": "typed", "age": "old" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_validation_failures_are_422() {
        let app = TestApp::new().await;

        let response = app
            .send(Method::POST, "/api/v1/users", Some(json!({ "first_name": "Nobody" })))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(read_json(response).await["code"], "VALIDATION_ERROR");

        let response = app
            .send(
                Method::POST,
                "/api/v1/users",
                Some(json!({ "username": "minus", "age": -1 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_409() {
        let app = TestApp::new().await;
        app.create(json!({ "username": "twin" })).await;

        let response = app
            .send(Method::POST, "/api/v1/users", Some(json!({ "username": "twin" })))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = TestApp::new().await;

        let response = app.send(Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let request_id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(request_id.starts_with("req_"));

        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "caller-supplied")
            .body(Body::empty())
            .unwrap();
        let response = app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "caller-supplied");
    }

    #[tokio::test]
    async fn test_ready_probe() {
        let app = TestApp::new().await;
        let response = app.send(Method::GET, "/ready", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["ready"], true);
    }
}
