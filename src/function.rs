//! The function contract served by [`Host`](crate::Host)
//!
//! A function is anything that handles HTTP requests. Lifecycle hooks and
//! health probes all have defaults, so the minimal implementation is a single
//! `handle` method.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};

use crate::error::BoxError;

/// Default address the host binds when `LISTEN_ADDRESS` is not set.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8080";

/// Environment variable controlling the bind address.
pub const LISTEN_ADDRESS_VAR: &str = "LISTEN_ADDRESS";

/// Result of a liveness or readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Whether the probe passed
    pub ok: bool,
    /// Message returned in the probe response body
    pub message: String,
}

impl Probe {
    /// A passing probe
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    /// A failing probe
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Snapshot of the process environment handed to [`Function::start`]
#[derive(Debug, Clone, Default)]
pub struct Config {
    env: HashMap<String, String>,
}

impl Config {
    /// Capture the current process environment
    pub fn from_env() -> Self {
        Self {
            env: std::env::vars().collect(),
        }
    }

    /// Build a config from explicit values. Useful in tests.
    pub fn from_iter(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            env: vars.into_iter().collect(),
        }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// The address the host should bind, `LISTEN_ADDRESS` or the default
    pub fn listen_address(&self) -> &str {
        self.get(LISTEN_ADDRESS_VAR).unwrap_or(DEFAULT_LISTEN_ADDRESS)
    }
}

/// The contract a served function implements.
///
/// Only [`handle`](Function::handle) is required. The lifecycle hooks
/// `start`/`stop` and the probes `alive`/`ready` have default implementations
/// that the host detects through normal trait dispatch.
#[async_trait]
pub trait Function: Send + Sync + 'static {
    /// Handle an HTTP request.
    ///
    /// Errors returned here are converted by the host into 500 responses;
    /// they never tear down the server.
    async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, BoxError>;

    /// Called once before the listener binds. Receives the environment.
    async fn start(&self, _config: Config) -> Result<(), BoxError> {
        tracing::info!("Function does not implement 'start', skipping");
        Ok(())
    }

    /// Called once after the server stops accepting requests.
    async fn stop(&self) -> Result<(), BoxError> {
        tracing::info!("Function does not implement 'stop', skipping");
        Ok(())
    }

    /// Liveness probe, served at `/health/liveness`
    async fn alive(&self) -> Probe {
        Probe::ok("Alive")
    }

    /// Readiness probe, served at `/health/readiness`
    async fn ready(&self) -> Probe {
        Probe::ok("Ready")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    #[async_trait]
    impl Function for Minimal {
        async fn handle(&self, _req: Request<Body>) -> Result<Response<Body>, BoxError> {
            Ok(Response::new(Body::from("OK")))
        }
    }

    #[tokio::test]
    async fn test_default_probes() {
        let f = Minimal;
        assert_eq!(f.alive().await, Probe::ok("Alive"));
        assert_eq!(f.ready().await, Probe::ok("Ready"));
    }

    #[tokio::test]
    async fn test_default_lifecycle_is_noop() {
        let f = Minimal;
        assert!(f.start(Config::default()).await.is_ok());
        assert!(f.stop().await.is_ok());
    }

    #[test]
    fn test_listen_address_default() {
        let config = Config::default();
        assert_eq!(config.listen_address(), "127.0.0.1:8080");

        let config = Config::from_iter([(
            LISTEN_ADDRESS_VAR.to_string(),
            "0.0.0.0:9000".to_string(),
        )]);
        assert_eq!(config.listen_address(), "0.0.0.0:9000");
    }
}
