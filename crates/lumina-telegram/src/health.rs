//! Keep-alive HTTP endpoint for hosts that expect a listening port.

use axum::{routing::get, Router};
use tracing::info;

/// Body returned by `GET /health`.
pub const HEALTH_BODY: &str = "Lumina is alive";

async fn health() -> &'static str {
    HEALTH_BODY
}

/// Creates the health router.
pub fn create_router() -> Router {
    Router::new().route("/health", get(health))
}

/// Serves the health router on `0.0.0.0:<port>` until the process exits.
pub async fn serve(port: u16) -> Result<(), std::io::Error> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Health endpoint listening on {}", addr);
    axum::serve(listener, create_router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = TestServer::new(create_router()).unwrap();

        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_text(HEALTH_BODY);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let server = TestServer::new(create_router()).unwrap();

        let response = server.get("/").await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
