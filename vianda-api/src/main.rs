use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vianda_api::gateway::MercadoPagoGateway;
use vianda_api::{app, AppState, AuthConfig};
use vianda_store::{InMemoryReceiptStore, RealtimeOrderStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vianda_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = vianda_store::app_config::Config::load()?;
    tracing::info!("Starting Vianda API on port {}", config.server.port);

    let orders = Arc::new(RealtimeOrderStore::new());
    let receipts = Arc::new(InMemoryReceiptStore::new(
        config.gateway.public_base_url.clone(),
    ));
    let gateway = Arc::new(MercadoPagoGateway::new(&config.gateway));

    let app_state = AppState {
        orders,
        receipts,
        gateway,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        back_urls: config.gateway.back_urls(),
        pricing: config.business_rules.pricing(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
