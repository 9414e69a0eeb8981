//! Network module with deferred startup lifecycle.
//!
//! `new()` creates resources, `start()` binds the TCP listener, and
//! `serve()` starts accepting connections. Callers can register operations on
//! the router between construction and `serve()`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::Layer;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    health_handler, invoke_handler, liveness_handler, readiness_handler, AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::devtools::{ExplorerLayer, ExplorerPage};
use crate::service::{OperationRouter, OperationService, ServerConfig};

/// Manages the full HTTP server lifecycle.
///
/// Follows the deferred startup pattern:
/// 1. `new()` -- allocates shared state (operation service, shutdown controller)
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- begins accepting connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    server_config: Arc<ServerConfig>,
    listener: Option<TcpListener>,
    operations: Arc<OperationService>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        server_config: ServerConfig,
        router: OperationRouter,
    ) -> Self {
        let server_config = Arc::new(server_config);
        Self {
            config,
            operations: Arc::new(OperationService::new(router, Arc::clone(&server_config))),
            server_config,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Returns a shared reference to the operation service.
    #[must_use]
    pub fn operations(&self) -> Arc<OperationService> {
        Arc::clone(&self.operations)
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    /// - `POST /{operation}` -- invoke a registered operation
    ///
    /// In development (and unless disabled) the operations explorer sits in
    /// front of routing. Production routers never contain it.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            operations: Arc::clone(&self.operations),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };

        let routes = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/{operation}", post(invoke_handler))
            .with_state(state);

        // `Router::layer` would run after route matching, so the explorer wraps
        // the finished router and sees every request before it is routed.
        let router = if self.server_config.explorer_active() {
            let page = ExplorerPage::new(
                &self.server_config.explorer,
                self.server_config.environment,
                Arc::new(self.operations.router().clone()),
            );
            info!(path = page.path(), "operations explorer enabled");
            Router::new().fallback_service(ExplorerLayer::new(page).layer(routes))
        } else {
            routes
        };

        router.layer(build_http_layers(&self.config))
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured port
    /// when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(
            host = %self.config.host,
            port,
            environment = %self.server_config.environment,
            "TCP listener bound"
        );

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until the `shutdown` future resolves.
    ///
    /// Consumes `self` because the listener is moved into the server. When the
    /// signal fires, the health state moves to Draining. Once axum has closed
    /// its connections, this waits up to `drain_timeout` for in-flight
    /// operation calls before reporting Stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, or if the server
    /// hits a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let router = self.build_router();
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let shutdown_ctrl = self.shutdown;

        // Transition to Ready so readiness probes pass.
        shutdown_ctrl.set_ready();
        info!("serving HTTP connections");

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("shutdown signal received, draining");
                signal_ctrl.trigger_shutdown();
            })
            .await?;

        if shutdown_ctrl.wait_for_drain(self.config.drain_timeout).await {
            info!("all in-flight operations drained");
        } else {
            warn!(
                in_flight = shutdown_ctrl.in_flight_count(),
                "drain timeout expired with operations still in flight"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use super::*;
    use crate::devtools::ExplorerConfig;
    use crate::network::handlers::test_support::sample_router;
    use crate::network::HealthState;
    use crate::service::Environment;

    fn module(environment: Environment) -> NetworkModule {
        let server_config = ServerConfig {
            environment,
            ..ServerConfig::default()
        };
        NetworkModule::new(NetworkConfig::default(), server_config, sample_router())
    }

    async fn send(router: Router, method: Method, uri: &str, body: &'static str) -> Response {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        router.oneshot(req).await.unwrap()
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = module(Environment::Production);
        assert!(Arc::ptr_eq(
            &module.shutdown_controller(),
            &module.shutdown_controller()
        ));
    }

    #[tokio::test]
    async fn development_router_serves_explorer() {
        let router = module(Environment::Development).build_router();

        let resp = send(router.clone(), Method::GET, "/explorer", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=UTF-8");
        let plain = body_string(resp).await;
        assert!(plain.contains("Operations: <span id=\"operation-count\">3</span>"));
        for name in ["Echo", "Fail", "Sleep"] {
            assert!(plain.contains(&format!("<h3>{name}</h3>")));
        }

        let resp = send(router, Method::GET, "/explorer/", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, plain);
    }

    #[tokio::test]
    async fn explorer_runs_before_route_matching() {
        let router = module(Environment::Development).build_router();

        for path in ["/explorer", "/explorer/"] {
            let req = Request::builder()
                .uri(path)
                .header("accept-encoding", "gzip")
                .body(Body::empty())
                .unwrap();
            let resp = router.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().get("allow").is_none());
            assert!(resp.headers().contains_key("x-request-id"));
        }

        // Non-explorer traffic still reaches the router's own method handling.
        let resp = send(router, Method::GET, "/Echo", "").await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(resp.headers().contains_key("allow"));
    }

    #[tokio::test]
    async fn explorer_reflects_operations_registered_later() {
        let module = module(Environment::Development);
        let router = module.build_router();
        module.operations().router().register(
            "Late",
            crate::service::handler_fn(|_ctx, payload| async move { Ok(payload) }),
        );

        let body = body_string(send(router, Method::GET, "/explorer", "").await).await;
        assert!(body.contains("<h3>Late</h3>"));
        assert!(body.contains("Operations: <span id=\"operation-count\">4</span>"));
    }

    #[tokio::test]
    async fn production_router_has_no_explorer() {
        let router = module(Environment::Production).build_router();

        let resp = send(router.clone(), Method::GET, "/explorer", "").await;
        assert_ne!(resp.status(), StatusCode::OK);
        assert!(!body_string(resp).await.contains("<!DOCTYPE html>"));

        let resp = send(router, Method::GET, "/explorer/", "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn disabled_explorer_is_not_installed_in_development() {
        let server_config = ServerConfig {
            environment: Environment::Development,
            explorer: ExplorerConfig {
                enabled: false,
                ..ExplorerConfig::default()
            },
            ..ServerConfig::default()
        };
        let module = NetworkModule::new(NetworkConfig::default(), server_config, sample_router());
        let router = module.build_router();

        let resp = send(router, Method::GET, "/explorer/", "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn operations_are_invoked_through_the_explorer_stage() {
        let router = module(Environment::Development).build_router();

        let resp = send(router, Method::POST, "/Echo", r#"{"name":"x"}"#).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, r#"{"name":"x"}"#);
    }

    #[tokio::test]
    async fn unknown_operation_returns_404_json() {
        let router = module(Environment::Production).build_router();

        let resp = send(router, Method::POST, "/CreateWidget", "{}").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_string(resp).await.contains("unknown_operation"));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let router = module(Environment::Development).build_router();
        let resp = send(router, Method::GET, "/health/live", "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = module(Environment::Production);
        let port = module.start().await.expect("start should succeed");
        assert!(port > 0, "OS-assigned port should be > 0");
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_fails_without_start() {
        let module = module(Environment::Production);
        let err = module.serve(std::future::pending::<()>()).await.unwrap_err();
        assert!(err.to_string().contains("start() must be called"));
    }

    #[tokio::test]
    async fn serve_drains_and_stops_on_signal() {
        let mut module = module(Environment::Production);
        module.start().await.unwrap();
        let shutdown = module.shutdown_controller();

        module.serve(async {}).await.unwrap();
        assert_eq!(shutdown.health_state(), HealthState::Stopped);
    }
}
