use std::sync::Arc;

use anyhow::Context;

use storefront_api::app::{self, services};
use storefront_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(services::build_services(&config)?);
    let app = app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        store = services.backend(),
        "listening"
    );

    // Requests are served while the store is still being provisioned; until
    // bootstrap finishes they fail with a store-unavailable error.
    let bootstrap = services.clone();
    tokio::spawn(async move {
        bootstrap.run_bootstrap().await;
    });

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
