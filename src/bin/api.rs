//! Order intake API: HTTP server over Postgres with `order.created`
//! publication.

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use orderflow::config::Config;
use orderflow::metrics;
use orderflow::publisher::AmqpEventPublisher;
use orderflow::server::{AppState, build_router};
use orderflow::service::OrderService;
use orderflow::store::PgOrderStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "orderflow=info".into()))
        .with(fmt::layer())
        .init();

    let config = Config::from_env();

    let metrics_handle = metrics::install().context("failed to install metrics recorder")?;
    metrics::describe();

    let store = PgOrderStore::connect(&config.database)
        .await
        .context("failed to connect to Postgres")?;
    store.migrate().await.context("failed to run migrations")?;

    let publisher = AmqpEventPublisher::new(config.broker.url.clone());
    let service = Arc::new(OrderService::new(Arc::new(store), Arc::new(publisher)));

    let app = build_router(AppState::new(service, metrics_handle));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "order API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("order API shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
