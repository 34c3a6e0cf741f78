//! Session gateway server entry point.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use session_gateway::adapters::backend::{HttpBackendClient, HttpBackendConfig};
use session_gateway::adapters::http::{gateway_app, GatewayAppState, GatewayHttpOptions};
use session_gateway::application::handlers::GatewayRouter;
use session_gateway::config::{AppConfig, LogFormat, ServerConfig};
use session_gateway::domain::gateway::BackendRouteTable;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    let routes = BackendRouteTable::standard(|family| config.backend.base_url_for(family));
    routes.ensure_complete()?;

    let backend = HttpBackendClient::new(
        HttpBackendConfig::new(config.backend.refresh_url())
            .with_timeout(config.backend.timeout())
            .with_connect_timeout(config.backend.connect_timeout()),
    )?;

    for entry in routes.entries() {
        tracing::info!(
            family = %entry.family,
            target = %entry.target_url("", None),
            "Registered backend route"
        );
    }

    let router = GatewayRouter::new(Arc::new(routes), Arc::new(backend));
    let options = GatewayHttpOptions {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.allowed_origins(),
    };
    let app = gateway_app(GatewayAppState::new(Arc::new(router)), &options);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "Session gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Session gateway stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    match server.log_format() {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
