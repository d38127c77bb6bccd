use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use da_gateway_config::{ApiConfig, FromEnv, MemstoreConfig, ObjectStoreConfig, StorageConfig};
use da_gateway_proxy::RestApi;
use da_gateway_store::builder::build_storage;
use da_gateway_vlog::{Logs, ObservabilityBuilder};
use tokio::sync::watch;

/// Time given to background tasks to finish after a stop signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(author = "The DA Gateway Team", version, about = "DA gateway server")]
struct Cli {
    /// Port to serve the REST API on. Overrides the `DA_GATEWAY_API_PORT` env var.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Cli::parse();

    let mut api_config = ApiConfig::from_env().context("ApiConfig")?;
    if let Some(port) = opt.port {
        api_config.port = port;
    }
    let logs = Logs::new(&api_config.log_format)
        .context("invalid log format")?
        .with_log_directives(api_config.log_directives.clone());
    let _guard = ObservabilityBuilder::new()
        .with_logs(Some(logs))
        .try_build()?;

    let storage_config = StorageConfig::from_env().context("StorageConfig")?;
    storage_config
        .validate()
        .context("invalid storage configuration")?;
    let memstore_config = MemstoreConfig::from_env().context("MemstoreConfig")?;
    let object_store_config =
        ObjectStoreConfig::from_env_optional().context("ObjectStoreConfig")?;

    let components = build_storage(&storage_config, &memstore_config, object_store_config)
        .await
        .context("failed building storage")?;
    tracing::info!(
        "Storage is initialized; dispersing to EigenDA {}",
        components.manager.get_dispersal_backend()
    );

    let (stop_sender, stop_receiver) = watch::channel(false);
    let mut tasks = components.spawn_background_tasks(&stop_receiver);
    let api = RestApi::new(components.manager.clone(), components.keccak_manager.clone());
    let server = tokio::spawn(async move {
        da_gateway_proxy::run_server(api, &api_config, stop_receiver).await
    });
    tasks.push(server);

    let finished_task = tokio::select! {
        (result, task_idx, _) = futures::future::select_all(tasks.iter_mut()) => {
            match result {
                Ok(Ok(())) => tracing::warn!("Task #{task_idx} finished unexpectedly"),
                Ok(Err(err)) => tracing::error!("Task #{task_idx} failed: {err:#}"),
                Err(err) => tracing::error!("Task #{task_idx} panicked: {err}"),
            }
            Some(task_idx)
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed listening for Ctrl+C")?;
            tracing::info!("Stop signal received, shutting down");
            None
        }
    };
    // A completed handle must not be polled again.
    if let Some(task_idx) = finished_task {
        tasks.swap_remove(task_idx);
    }
    stop_sender.send_replace(true);

    for task in tasks {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => tracing::error!("Task failed during shutdown: {err:#}"),
            Ok(Err(err)) => tracing::error!("Task panicked during shutdown: {err}"),
            Err(_) => tracing::warn!("Task did not stop in {SHUTDOWN_TIMEOUT:?}"),
        }
    }
    tracing::info!("DA gateway stopped");
    Ok(())
}
