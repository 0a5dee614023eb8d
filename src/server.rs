use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use weatherfusion::api::{self, AppState};
use weatherfusion::config::Config;
use weatherfusion::ledger::FjallLedger;
use weatherfusion::observability::Metrics;
use weatherfusion::pipeline::Pipeline;
use weatherfusion::provider::{Provider, ReqwestClient};
use weatherfusion::retention::Pruner;
use weatherfusion::storage::ArtifactStore;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stores shared by every command
struct Stores {
    ledger: FjallLedger,
    artifacts: ArtifactStore,
}

fn open_stores(config: &Config) -> Result<Stores, AnyError> {
    info!(path = %config.server.ledger_path.display(), "Opening ledger");
    let ledger = FjallLedger::open(&config.server.ledger_path)
        .map_err(|e| format!("Failed to open ledger: {}", e))?;

    let artifacts = ArtifactStore::local(&config.server.artifact_dir)
        .map_err(|e| format!("Failed to open artifact store: {}", e))?;

    Ok(Stores { ledger, artifacts })
}

/// Pipeline loop plus read API in one process
///
/// The ledger can only be opened by one process at a time, so the API shares
/// the pipeline's handle.
pub async fn run(config: Config, once: bool) -> Result<(), AnyError> {
    let Stores { ledger, artifacts } = open_stores(&config)?;

    let client = ReqwestClient::new(&config.provider.http_config())?;
    let provider = Provider::new(
        Arc::new(client),
        config.provider.base_url.clone(),
        config.provider.manifest_url.clone(),
        config.provider.wind_level,
    );

    let metrics = Arc::new(Metrics::new());
    let pipeline = Pipeline::builder()
        .ledger(ledger.clone())
        .artifacts(artifacts.clone())
        .provider(provider)
        .settings(config.acquisition.settings())
        .policy(config.retention.policy())
        .metrics(Arc::clone(&metrics))
        .interval(config.schedule.interval())
        .prune_interval(config.schedule.prune_interval())
        .build();

    if once {
        pipeline.run_cycle(Utc::now()).await;
        ledger.persist()?;
        return Ok(());
    }

    let state = AppState::new(ledger.clone(), artifacts, metrics);
    let api = tokio::spawn(api::run(config.server.bind_addr, state, shutdown_signal()));

    pipeline.run(shutdown_signal()).await;
    api.await??;

    ledger.persist()?;
    Ok(())
}

/// Read API only, for inspecting a ledger while no pipeline is running
pub async fn serve(config: Config) -> Result<(), AnyError> {
    let Stores { ledger, artifacts } = open_stores(&config)?;

    let state = AppState::new(ledger, artifacts, Arc::new(Metrics::new()));
    api::run(config.server.bind_addr, state, shutdown_signal()).await
}

/// One retention pass
pub async fn prune(config: Config) -> Result<(), AnyError> {
    let Stores { ledger, artifacts } = open_stores(&config)?;

    let pruner = Pruner::new(ledger, artifacts, config.retention.policy());
    let stats = pruner.run(Utc::now()).await?;
    info!(records = stats.records(), "Retention pass finished");
    Ok(())
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
