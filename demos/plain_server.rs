//! Minimal function: responds "OK" to everything, with default health probes.
//!
//! Run with: cargo run --example plain_server

use axum::body::Body;
use axum::http::{Request, Response};
use tower_func::{BoxError, Function};

struct Plain;

#[async_trait::async_trait]
impl Function for Plain {
    async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, BoxError> {
        tracing::info!(path = %req.uri().path(), "Handling request");
        Ok(Response::new(Body::from("OK")))
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    tower_func::serve(Plain).await
}
