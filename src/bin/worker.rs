//! Order processing worker: consumes `order.created` events and commits
//! the `PROCESSED` transition.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use orderflow::config::Config;
use orderflow::consumer::OrderConsumer;
use orderflow::metrics;
use orderflow::processor::OrderProcessor;
use orderflow::store::PgOrderStore;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "orderflow=info".into()))
        .with(fmt::layer())
        .init();

    let config = Config::from_env();

    metrics::install().context("failed to install metrics recorder")?;
    metrics::describe();

    let store = PgOrderStore::connect(&config.database)
        .await
        .context("failed to connect to Postgres")?;
    store.migrate().await.context("failed to run migrations")?;

    let processor = OrderProcessor::new(Arc::new(store));
    let consumer = OrderConsumer::new(config.broker.url.clone(), processor);

    info!("order worker starting");
    loop {
        match consumer.run().await {
            Ok(()) => warn!("consume stream ended, reconnecting"),
            Err(e) => error!(error = %e, "consumer failed, reconnecting"),
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
