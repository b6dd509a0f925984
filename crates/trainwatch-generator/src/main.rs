//! Generator process entrypoint: run the multi-pass layout pipeline, sleep
//! `GENERATOR_RATE` seconds, repeat, until SIGINT/SIGTERM.

use anyhow::Result;
use clap::Parser;
use time::Duration as TimeDuration;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use trainwatch_layout::pipeline::{self, PipelineConfig};
use trainwatch_layout::LayoutConfig;
use trainwatch_store::{MemoryStore, MongoStore, Store};
use trainwatch_topology::BuilderConfig;

/// Periodic rebuild of the berth-graph layout.
#[derive(Parser, Debug)]
#[command(author, version, about = "Layout generator for the rail telemetry store")]
struct Args {
    /// Run the pipeline once and exit, skipping the sleep loop (the
    /// scheduler otherwise runs, sleeps, and repeats); for scripting and
    /// integration tests.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = trainwatch_config::Settings::from_env()?;
    trainwatch_config::init_logging(&settings.log_level);

    let store: Box<dyn Store> = match MongoStore::connect(&settings.mongo.uri()).await {
        Some(store) => Box::new(store),
        None => {
            warn!("proceeding without a durable store backing (connection failed)");
            Box::new(MemoryStore::new())
        }
    };

    let config = PipelineConfig {
        builder: BuilderConfig {
            delta_b: TimeDuration::seconds(settings.generator.delta_b_seconds),
            delta_t: TimeDuration::hours(settings.generator.delta_t_hours),
        },
        layout: LayoutConfig {
            k: settings.generator.k,
            iterations: settings.generator.iterations,
            scale: settings.generator.scale,
        },
        cut_d_initial: settings.generator.cut_d,
    };

    let mut shutdown = wait_for_shutdown_signal();

    loop {
        info!("generator run starting");
        if let Err(error) = pipeline::run(store.as_ref(), &config).await {
            warn!(%error, "generator run aborted, previous SELECTED state preserved");
        }

        if args.once {
            return Ok(());
        }

        tokio::select! {
            () = sleep(Duration::from_secs(settings.generator.rate_seconds)) => {}
            _ = &mut shutdown => {
                info!("shutdown signal received, exiting");
                return Ok(());
            }
        }
    }
}

fn wait_for_shutdown_signal() -> tokio::task::JoinHandle<()> {
    tokio::spawn(async {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(error) => {
                    warn!(%error, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    })
}
