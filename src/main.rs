//! vpnboard node adapter
//!
//! Polls the panel for node configuration and users on independent timers
//! and keeps the last applied state in memory.

// Use mimalloc as the global allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use std::sync::Arc;

use vpnboard_rs::business::{ApiClient, BackgroundTasks, NodeState, TaskConfig};
use vpnboard_rs::config::{ApiConfig, CliArgs};
use vpnboard_rs::core::PanelApi;
use vpnboard_rs::logger::{self, log};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse_args();
    cli.validate()?;

    logger::init_logger(&cli.log_mode);

    let api_config = ApiConfig::from_cli(&cli);
    let client = Arc::new(ApiClient::new(api_config)?);

    let info = client.describe();
    log::info!(
        api = %info.api_host,
        node_id = info.node_id,
        node_type = %info.node_type,
        disable_custom_config = client.config().disable_custom_config,
        "Starting vpnboard node adapter"
    );
    log::info!(count = client.fetch_local_rules().len(), "Detection rules ready");

    let state = Arc::new(NodeState::new());
    let task_config = TaskConfig::new(
        cli.fetch_node_interval,
        cli.fetch_users_interval,
        cli.report_status_interval,
    );
    let background_tasks = BackgroundTasks::new(
        task_config,
        Arc::clone(&client) as Arc<dyn PanelApi>,
        Arc::clone(&state),
    );
    let handle = background_tasks.start();

    wait_for_shutdown().await?;

    handle.shutdown().await;
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                log::info!("SIGINT received, shutting down...");
            }
            _ = sigterm.recv() => {
                log::info!("SIGTERM received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        log::info!("Shutdown signal received...");
    }

    Ok(())
}
