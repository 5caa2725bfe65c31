//! Wallet Tracker Notifier Server
//!
//! Watches Redis keyspace notifications for wallet-tracking keys, records the
//! referenced transactions, and emails the wallet's subscriber.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use anyhow::Context;
use clap::Parser;
use config::file::{ContentConfig, NotificationConfig, RedisConfig};
use config::{ConfigLoader, get_database_url};
use redis::IntoConnectionInfo;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wtrk_core::config::shared;
use wtrk_core::events::{RedisKeyspaceSource, keyspace_pattern, keyspace_prefix};
use wtrk_core::framework::DatabaseProcessor;
use wtrk_core::processors::{IdentityPipeline, KeyEventListener, PipelineDeps};
use wtrk_core::services::{
    AmqpMailSender, HttpMailSender, IpfsGatewayFetcher, NotificationSender, PgRecordStore,
    PgSubscriberDirectory, RedisContentIndex,
};

/// Wallet Tracker Notifier - emails subscribers about tracked wallet activity
#[derive(Parser, Debug)]
#[command(name = "wtrk-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./wtrk-config.toml")]
    config: PathBuf,

    /// Listen address, overriding `[server].listen`
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Apply pending migrations before starting
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting wtrk-server");

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded = config_loader
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;
    tracing::info!(path = %args.config.display(), "Configuration loaded");

    let db_pool = connect_database(args.migrate).await?;
    let redis_client = connect_redis(&loaded.redis).await?;

    // Collaborators shared by the pipeline and the HTTP handlers
    let processor = DatabaseProcessor::new(db_pool.clone());
    let subscribers = Arc::new(PgSubscriberDirectory::new(processor.clone()));
    let records = Arc::new(PgRecordStore::new(processor));
    let index = RedisContentIndex::connect(&redis_client)
        .await
        .context("opening Redis data connection")?;
    let notifier = build_notifier(&loaded.notification).await?;

    let pipeline_config = shared(loaded.pipeline);
    let pipeline = IdentityPipeline::new(
        PipelineDeps {
            subscribers: subscribers.clone(),
            index: Arc::new(index),
            fetcher: Arc::new(build_fetcher(&loaded.content)),
            records: records.clone(),
            notifier,
        },
        pipeline_config.clone(),
    );

    let database = loaded.redis.database;
    let source = RedisKeyspaceSource::subscribe(
        &redis_client,
        keyspace_pattern(database, &loaded.redis.key_pattern),
    )
    .await
    .context("subscribing to keyspace notifications")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener_stopped = Arc::new(Notify::new());
    let listener = KeyEventListener::new(source, pipeline, keyspace_prefix(database), shutdown_rx);
    let listener_task = tokio::spawn({
        let listener_stopped = listener_stopped.clone();
        async move {
            let stats = listener.run().await;
            listener_stopped.notify_one();
            stats
        }
    });

    let state = AppState::new(subscribers, records, pipeline_config);
    let reload_stop = spawn_config_reload_handler(state.clone(), config_loader);

    let result = run_server(build_router(state), loaded.server.listen, listener_stopped).await;

    // HTTP is down; stop the background tasks before releasing the pool.
    reload_stop.notify_one();
    let _ = shutdown_tx.send(true);
    match listener_task.await {
        Ok(stats) => tracing::info!(received = stats.received, "Key event listener joined"),
        Err(e) => tracing::error!(error = %e, "Key event listener task panicked"),
    }

    db_pool.close().await;
    tracing::info!("wtrk-server stopped");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,lapin=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn connect_database(migrate: bool) -> anyhow::Result<PgPool> {
    let database_url = get_database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("connecting to PostgreSQL")?;
    tracing::info!("PostgreSQL connection pool ready");

    if migrate {
        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        tracing::info!("Migrations applied");
    }
    Ok(pool)
}

/// Open a Redis client on the configured logical database, optionally
/// turning on keyspace notifications first.
async fn connect_redis(config: &RedisConfig) -> anyhow::Result<redis::Client> {
    let mut info = config
        .url
        .as_str()
        .into_connection_info()
        .context("parsing redis.url")?;
    info.redis.db = i64::from(config.database);
    let client = redis::Client::open(info).context("creating Redis client")?;

    if config.configure_keyspace_events {
        RedisKeyspaceSource::enable_keyspace_events(&client, &config.keyspace_event_flags)
            .await
            .context("enabling keyspace notifications")?;
    }
    Ok(client)
}

fn build_fetcher(config: &ContentConfig) -> IpfsGatewayFetcher {
    IpfsGatewayFetcher::new(
        config.gateway_url.clone(),
        Duration::from_secs(config.timeout_secs),
    )
}

async fn build_notifier(
    config: &NotificationConfig,
) -> anyhow::Result<Arc<dyn NotificationSender>> {
    match config {
        NotificationConfig::Http {
            endpoint,
            timeout_secs,
        } => {
            tracing::info!(endpoint = %endpoint, "Delivering notifications over HTTP");
            Ok(Arc::new(HttpMailSender::new(
                endpoint.clone(),
                Duration::from_secs(*timeout_secs),
            )))
        }
        NotificationConfig::Amqp { url, queue } => {
            let sender = AmqpMailSender::connect(url, queue)
                .await
                .context("connecting to AMQP broker")?;
            Ok(Arc::new(sender))
        }
    }
}
