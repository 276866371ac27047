use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use transmission_sweeper::core::config::Config;
use transmission_sweeper::core::shutdown::{shutdown_signal, ShutdownHandle};
use transmission_sweeper::core::tracing_init;
use transmission_sweeper::rpc::client::{TorrentBackend, TransmissionClient};
use transmission_sweeper::sweep::policy::RemovalPolicy;
use transmission_sweeper::sweep::runner::run_poll_loop;
use transmission_sweeper::sweep::tracker::CompletionTracker;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        If this is your first time running the sweeper, copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    // Initialize tracing/logging
    tracing_init::init_tracing(&config.logging)?;

    // Build Tokio runtime with configured number of threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.poll.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    let policy = RemovalPolicy::from_config(&config.removal)?;

    info!(
        config_path = %config_path.display(),
        endpoint = %config.connection.endpoint_url(),
        policy = ?policy,
        interval_secs = config.poll.interval_secs,
        num_threads = config.poll.num_threads,
        "Transmission sweeper starting"
    );

    let client = TransmissionClient::new(&config.connection)
        .context("Failed to create Transmission RPC client")?;

    // A dead backend at startup is fatal; transient failures mid-run are not
    let torrents = client
        .list_torrents()
        .await
        .context("Failed to connect to the Transmission RPC backend")?;

    info!(
        torrents = torrents.len(),
        "Connected to the Transmission RPC backend"
    );

    let (handle, token) = ShutdownHandle::new();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.trigger();
    });

    let mut tracker = CompletionTracker::new(policy);
    run_poll_loop(
        &client,
        &mut tracker,
        Duration::from_secs(config.poll.interval_secs),
        token,
    )
    .await;

    info!("Shutting down gracefully");

    Ok(())
}
