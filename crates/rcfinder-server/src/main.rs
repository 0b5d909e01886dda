mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use rcfinder_geo::RegionResolver;
use rcfinder_search::{CoordinatorConfig, ProviderApiClient, SearchCoordinator};

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = rcfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let resolver = Arc::new(RegionResolver::load(
        &config.regions_path,
        &config.boundaries_path,
    )?);
    tracing::info!(
        regions = resolver.regions().len(),
        zips = resolver.zip_table().len(),
        "regional center dataset loaded"
    );

    let client = ProviderApiClient::new(
        &config.provider_api_url,
        config.http_request_timeout_secs,
        &config.http_user_agent,
        config.http_max_retries,
        config.http_retry_backoff_base_secs,
    )?;
    let coordinator = Arc::new(SearchCoordinator::new(
        client,
        resolver,
        CoordinatorConfig::from_app_config(&config),
    ));

    let app = build_app(AppState { coordinator });
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
