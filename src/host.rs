//! HTTP host for serving a [`Function`]
//!
//! The host owns the request lifecycle: it calls `start` before binding,
//! serves health probes at `/health/liveness` and `/health/readiness`, routes
//! everything else to the function's `handle`, converts handler errors into
//! 500 responses, and calls `stop` on shutdown.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::get;

use crate::error::BoxError;
use crate::function::{Config, Function, Probe};

/// Host that serves a function over HTTP
pub struct Host<F> {
    function: Arc<F>,
    listen_address: Option<String>,
}

impl<F: Function> Host<F> {
    /// Create a host for the given function
    pub fn new(function: F) -> Self {
        Self {
            function: Arc::new(function),
            listen_address: None,
        }
    }

    /// Override the bind address, taking precedence over `LISTEN_ADDRESS`
    pub fn listen_address(mut self, address: impl Into<String>) -> Self {
        self.listen_address = Some(address.into());
        self
    }

    /// Build the axum router serving this function.
    ///
    /// Exposed separately from [`serve`](Host::serve) so tests can drive it
    /// with `tower::ServiceExt::oneshot`.
    pub fn into_router(self) -> Router {
        Router::new()
            .route("/health/liveness", get(liveness::<F>))
            .route("/health/readiness", get(readiness::<F>))
            .fallback(handle::<F>)
            .with_state(self.function)
    }

    /// Run the function: start it, serve until shutdown, then stop it.
    pub async fn serve(self) -> Result<(), BoxError> {
        let config = Config::from_env();
        let address = self
            .listen_address
            .clone()
            .unwrap_or_else(|| config.listen_address().to_string());

        let function = Arc::clone(&self.function);

        tracing::info!("Starting function");
        function.start(config).await?;

        let router = self.into_router();
        let listener = tokio::net::TcpListener::bind(&address).await?;
        tracing::info!(address = %address, "Listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Stopping function");
        function.stop().await?;

        Ok(())
    }
}

/// Serve a function with default host settings.
pub async fn serve<F: Function>(function: F) -> Result<(), BoxError> {
    Host::new(function).serve().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

fn probe_response(probe: Probe) -> Response<Body> {
    let status = if probe.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let mut response = Response::new(Body::from(probe.message));
    *response.status_mut() = status;
    response
}

async fn liveness<F: Function>(State(function): State<Arc<F>>) -> Response<Body> {
    probe_response(function.alive().await)
}

async fn readiness<F: Function>(State(function): State<Arc<F>>) -> Response<Body> {
    probe_response(function.ready().await)
}

async fn handle<F: Function>(
    State(function): State<Arc<F>>,
    req: Request<Body>,
) -> Response<Body> {
    match function.handle(req).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Function handler failed");
            let mut response = Response::new(Body::from(format!("Error: {}", e)));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
