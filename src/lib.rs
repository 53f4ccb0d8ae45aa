pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;

use api::create_api_router;
use axum::Router;
use db::Database;
use jwt::{JwtConfig, TokenLifetimes};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access and refresh token lifetimes
    pub lifetimes: TokenLifetimes,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret, config.lifetimes));

    let api_router = create_api_router(config.db.clone(), jwt, config.secure_cookies);

    Router::new().nest("/api", api_router)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
