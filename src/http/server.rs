//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compose the authenticator and rate governor (the composition root)
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, headers)
//! - Apply hot-reloaded rate limit policies
//! - Serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Request, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::auth::TokenAuthenticator;
use crate::config::{Environment, GateConfig, RoutePolicy};
use crate::http::handlers;
use crate::http::middleware::{rate_limit_middleware, track_metrics};
use crate::http::request::{request_id_of, MakeRequestUuidV4};
use crate::security::RateGovernor;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<TokenAuthenticator>,
    pub governor: Arc<RateGovernor>,
    pub policies: Arc<ArcSwap<Vec<RoutePolicy>>>,
    pub cookie_name: Arc<str>,
    pub environment: Environment,
    pub started_at: Instant,
}

/// HTTP server for the gate.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GateConfig,
}

impl HttpServer {
    /// Build the server and its collaborators from configuration.
    pub fn new(config: GateConfig) -> Self {
        let secret = config.auth.resolve_secret();
        let authenticator = Arc::new(TokenAuthenticator::new(secret.as_deref()));
        let governor = Arc::new(RateGovernor::new(config.rate_limit_enforced()));
        Self::with_components(config, authenticator, governor)
    }

    /// Build the server around externally constructed collaborators.
    pub fn with_components(
        config: GateConfig,
        authenticator: Arc<TokenAuthenticator>,
        governor: Arc<RateGovernor>,
    ) -> Self {
        tracing::info!(
            environment = ?config.environment,
            auth_configured = authenticator.is_configured(),
            rate_limit_enforced = governor.is_enforcing(),
            rate_limited_routes = config.rate_limit.routes.len(),
            "Gate components initialized"
        );

        let state = AppState {
            authenticator,
            governor,
            policies: Arc::new(ArcSwap::from_pointee(config.rate_limit.routes.clone())),
            cookie_name: Arc::from(config.auth.cookie_name.as_str()),
            environment: config.environment,
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/api/auth/me", get(handlers::me))
            .route("/api/submit-score", post(handlers::submit_score))
            .route("/api/supervisor/overview", get(handlers::supervisor_overview))
            .route("/api/admin/status", get(handlers::admin_status))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ));

        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .merge(api)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(middleware::from_fn(track_metrics))
            .with_state(state);

        if config.security.enable_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.timeouts.request_secs),
                )),
        )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the rate limit
    /// policies; other settings need a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let policies = self.state.policies.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        let reload_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => {
                        let Some(update) = update else { break };
                        tracing::info!(
                            routes = update.rate_limit.routes.len(),
                            "Rate limit policies reloaded"
                        );
                        policies.store(Arc::new(update.rate_limit.routes));
                    }
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        // Already finished after a shutdown signal; aborted if serving failed.
        reload_task.abort();
        let _ = reload_task.await;
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id_of(request),
    )
}
