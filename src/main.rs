use std::error::Error;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hitpay_gateway::adapters::{webhook_router, HitPayApi, InMemoryOrderStore};
use hitpay_gateway::application::{HitPayGateway, PaymentProcessor};
use hitpay_gateway::config::{AppConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    let credentials = config.gateway.credentials();
    let api = HitPayApi::new(&credentials)?;
    let orders = Arc::new(InMemoryOrderStore::new());
    let gateway: Arc<dyn PaymentProcessor> = Arc::new(HitPayGateway::new(
        Arc::new(api),
        orders,
        credentials.verifier(),
        config.gateway.settings(),
    ));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        live_mode = credentials.live_mode(),
        api = credentials.base_url(),
        "Listening for HitPay notifications"
    );

    axum::serve(listener, webhook_router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    match config.server.environment.log_format() {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
