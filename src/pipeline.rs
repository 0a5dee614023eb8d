//! Scheduling loop
//!
//! One cycle runs radar, rain and wind acquisition, then fusion when any
//! source brought new data, then pruning when the prune interval has elapsed
//! since the last recorded pass. Every stage is isolated: a failing stage is
//! logged and counted, and the cycle moves on.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::acquisition::{Acquisition, AcquisitionSettings, SourceReport};
use crate::fusion::{FusionEngine, FusionReport};
use crate::ledger::FjallLedger;
use crate::observability::Metrics;
use crate::provider::Provider;
use crate::retention::{PruneStats, Pruner, RetentionPolicy};
use crate::storage::ArtifactStore;

/// What one cycle did; `None` for stages that failed or did not run
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub radar: Option<SourceReport>,
    pub rain: Option<SourceReport>,
    pub wind: Option<SourceReport>,
    pub fusion: Option<FusionReport>,
    pub prune: Option<PruneStats>,
}

impl CycleReport {
    pub fn has_new_data(&self) -> bool {
        [&self.radar, &self.rain, &self.wind]
            .into_iter()
            .flatten()
            .any(SourceReport::has_new_data)
    }
}

pub struct Pipeline {
    acquisition: Acquisition,
    fusion: FusionEngine,
    pruner: Pruner,
    metrics: Arc<Metrics>,
    interval: Duration,
    prune_interval: TimeDelta,
}

#[bon::bon]
impl Pipeline {
    #[builder]
    pub fn new(
        ledger: FjallLedger,
        artifacts: ArtifactStore,
        provider: Provider,
        #[builder(default)] settings: AcquisitionSettings,
        #[builder(default)] policy: RetentionPolicy,
        #[builder(default)] metrics: Arc<Metrics>,
        #[builder(default = Duration::from_secs(300))] interval: Duration,
        #[builder(default = TimeDelta::hours(1))] prune_interval: TimeDelta,
    ) -> Self {
        Self {
            acquisition: Acquisition::new(
                ledger.clone(),
                artifacts.clone(),
                provider,
                settings,
            ),
            fusion: FusionEngine::new(ledger.clone(), artifacts.clone()),
            pruner: Pruner::new(ledger, artifacts, policy),
            metrics,
            interval,
            prune_interval,
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Run a single cycle as of `now`
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport {
            radar: self.stage("radar", self.acquisition.run_radar(now)).await,
            ..CycleReport::default()
        };

        // A failed manifest fetch skips both forecast walks for this cycle
        if let Some(manifest) = self.stage("manifest", self.acquisition.manifest()).await {
            report.rain = self
                .stage("rain", self.acquisition.run_rain(now, &manifest))
                .await;
            report.wind = self
                .stage("wind", self.acquisition.run_wind(now, &manifest))
                .await;
        }

        for source in [&report.radar, &report.rain, &report.wind].into_iter().flatten() {
            self.metrics.slices_stored(source.stored);
            self.metrics.slices_skipped(source.skipped);
        }

        if report.has_new_data() {
            report.fusion = self.stage("fusion", self.fusion.run()).await;
            if let Some(fusion) = &report.fusion {
                self.metrics.danger_written(fusion.written);
            }
        }

        let prune_due = match self.pruner.is_due(now, self.prune_interval) {
            Ok(due) => due,
            Err(e) => {
                error!(stage = "prune", error = %e, "Stage failed");
                self.metrics.stage_failed();
                false
            }
        };
        if prune_due {
            report.prune = self.stage("prune", self.pruner.run(now)).await;
            if let Some(prune) = &report.prune {
                self.metrics.records_pruned(prune.records());
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            new_data = report.has_new_data(),
            slices_stored = snapshot.slices_stored,
            danger_written = snapshot.danger_written,
            records_pruned = snapshot.records_pruned,
            stage_failures = snapshot.stage_failures,
            "Cycle complete"
        );
        report
    }

    /// Run cycles on the configured interval until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_secs = self.interval.as_secs(), "Pipeline started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Pipeline stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle(Utc::now()).await;
                }
            }
        }
    }

    async fn stage<T, E, F>(&self, name: &str, fut: F) -> Option<T>
    where
        E: std::fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        match fut.await {
            Ok(value) => Some(value),
            Err(e) => {
                error!(stage = name, error = %e, "Stage failed");
                self.metrics.stage_failed();
                None
            }
        }
    }
}
