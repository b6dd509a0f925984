//! Collector process entrypoint: known-berth bootstrap, then a durable
//! STOMP subscription loop until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use trainwatch_feed::{known_feeds, FeedDispatcher};
use trainwatch_stomp::{ConnectConfig, FeedManager, StompError, Subscription};
use trainwatch_store::{MemoryStore, MongoStore, Store};

#[derive(Parser, Debug)]
#[command(author, version, about = "Durable STOMP collector for the rail telemetry store")]
struct Args;

#[tokio::main]
async fn main() -> Result<()> {
    let _args = Args::parse();
    let settings = trainwatch_config::Settings::from_env()?;
    trainwatch_config::init_logging(&settings.log_level);

    let store: Arc<dyn Store> = match MongoStore::connect(&settings.mongo.uri()).await {
        Some(store) => Arc::new(store),
        None => {
            warn!("proceeding without a durable store backing (connection failed)");
            Arc::new(MemoryStore::new())
        }
    };

    trainwatch_collector::bootstrap::run(store.as_ref()).await;

    let feeds: Vec<_> = known_feeds()
        .into_iter()
        .filter(|feed| match feed.kind {
            trainwatch_feed::FeedKind::Ppm => settings.collector.ppm,
            trainwatch_feed::FeedKind::Td => settings.collector.td,
            trainwatch_feed::FeedKind::Tm => settings.collector.tm,
        })
        .collect();

    if feeds.is_empty() {
        warn!("no feeds enabled (COLLECTOR_PPM/_TD/_TM are all false), exiting");
        return Ok(());
    }

    let subscriptions: Vec<Subscription> = feeds
        .iter()
        .flat_map(|feed| feed.subscriptions.clone())
        .collect();
    let dispatcher = FeedDispatcher::new(Arc::clone(&store), &feeds);

    let connect_config = ConnectConfig {
        host: "datafeeds.networkrail.co.uk".to_owned(),
        port: 61618,
        vhost: "datafeeds.networkrail.co.uk".to_owned(),
        login: settings.collector.nr_user.clone(),
        passcode: settings.collector.nr_pass.clone(),
        heartbeat_ms: (100_000, 100_000),
        max_attempts: settings.collector.attempts,
    };
    let manager = FeedManager::new(connect_config, subscriptions, dispatcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(wait_for_shutdown_signal(shutdown_tx));

    match manager.run(shutdown_rx).await {
        Ok(()) => {
            info!("collector shut down cleanly");
            Ok(())
        }
        Err(StompError::AttemptsExhausted(attempts)) => {
            // Exit 0 here too, so a supervisor restarts without a
            // crash-loop backoff of its own stacking on top of ours.
            warn!(attempts, "exhausted connection attempts, exiting");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

async fn wait_for_shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(signal) => signal,
        Err(error) => {
            warn!(%error, "failed to install SIGTERM handler");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT received, shutting down");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down");
        }
    }
    let _ = shutdown_tx.send(true);
}
