//! Retention pruner
//!
//! Keeps the ledger and artifact store bounded:
//!
//! - radar sweeps older than the radar max age
//! - rain forecast slices of every run but the newest
//! - wind slices older than the wind max age, plus superseded wind runs
//! - danger overlays older than the danger max age
//!
//! The artifact goes first, then the record. A crash in between leaves an
//! orphaned file, never a record pointing at nothing.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::ledger::{FjallLedger, LedgerError};
use crate::storage::{ArtifactKind, ArtifactStore, StorageError};

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Artifact store error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, RetentionError>;

/// Maximum ages per source
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub radar_max_age: TimeDelta,
    pub wind_max_age: TimeDelta,
    pub danger_max_age: TimeDelta,
    pub prune_superseded_wind: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            radar_max_age: TimeDelta::hours(24),
            wind_max_age: TimeDelta::hours(24),
            danger_max_age: TimeDelta::hours(24),
            prune_superseded_wind: true,
        }
    }
}

/// Deleted records and artifact files for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub records: usize,
    pub files: usize,
}

/// Pruning statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub radar: CategoryStats,
    pub predictions: CategoryStats,
    pub wind: CategoryStats,
    pub danger: CategoryStats,
}

impl PruneStats {
    pub fn records(&self) -> usize {
        self.radar.records + self.predictions.records + self.wind.records + self.danger.records
    }
}

#[derive(Clone)]
pub struct Pruner {
    ledger: FjallLedger,
    artifacts: ArtifactStore,
    policy: RetentionPolicy,
}

impl Pruner {
    pub fn new(ledger: FjallLedger, artifacts: ArtifactStore, policy: RetentionPolicy) -> Self {
        Self {
            ledger,
            artifacts,
            policy,
        }
    }

    /// Whether `interval` has elapsed since the last recorded pass
    pub fn is_due(&self, now: DateTime<Utc>, interval: TimeDelta) -> Result<bool> {
        Ok(match self.ledger.last_prune()? {
            Some(last) => now - last >= interval,
            None => true,
        })
    }

    /// Prune every category and record the pass time
    pub async fn run(&self, now: DateTime<Utc>) -> Result<PruneStats> {
        let stats = PruneStats {
            radar: self.prune_radar(now).await?,
            predictions: self.prune_predictions().await?,
            wind: self.prune_wind(now).await?,
            danger: self.prune_danger(now).await?,
        };

        self.ledger.record_prune(&now)?;
        self.ledger.persist()?;
        info!(
            radar = stats.radar.records,
            predictions = stats.predictions.records,
            wind = stats.wind.records,
            danger = stats.danger.records,
            "Pruning complete"
        );
        Ok(stats)
    }

    async fn prune_radar(&self, now: DateTime<Utc>) -> Result<CategoryStats> {
        let mut stats = CategoryStats::default();
        for record in self.ledger.radar_before(&(now - self.policy.radar_max_age))? {
            stats.files += self.remove_artifact(record.artifact_kind(), &record.id).await?;
            self.ledger.delete_rain(&record)?;
            stats.records += 1;
        }
        Ok(stats)
    }

    async fn prune_predictions(&self) -> Result<CategoryStats> {
        let mut stats = CategoryStats::default();
        let Some(current) = self.ledger.rain_prediction_version()? else {
            return Ok(stats);
        };

        for record in self.ledger.predictions_superseded_by(&current)? {
            stats.files += self.remove_artifact(record.artifact_kind(), &record.id).await?;
            self.ledger.delete_rain(&record)?;
            stats.records += 1;
        }
        Ok(stats)
    }

    async fn prune_wind(&self, now: DateTime<Utc>) -> Result<CategoryStats> {
        let mut expired = BTreeMap::new();
        for record in self.ledger.wind_before(&(now - self.policy.wind_max_age))? {
            expired.insert(record.id.clone(), record);
        }

        if self.policy.prune_superseded_wind {
            if let Some(current) = self.ledger.wind_version()? {
                for record in self.ledger.wind_superseded_by(&current)? {
                    expired.insert(record.id.clone(), record);
                }
            }
        }

        let mut stats = CategoryStats::default();
        for record in expired.into_values() {
            stats.files += self.remove_artifact(record.artifact_kind(), &record.id).await?;
            self.ledger.delete_wind(&record)?;
            stats.records += 1;
        }
        Ok(stats)
    }

    async fn prune_danger(&self, now: DateTime<Utc>) -> Result<CategoryStats> {
        let mut stats = CategoryStats::default();
        for record in self.ledger.danger_before(&(now - self.policy.danger_max_age))? {
            stats.files += self.remove_artifact(record.artifact_kind(), &record.id).await?;
            self.ledger.delete_danger(&record)?;
            stats.records += 1;
        }
        Ok(stats)
    }

    /// Delete an artifact, tolerating one that is already gone
    async fn remove_artifact(&self, kind: ArtifactKind, id: &str) -> Result<usize> {
        if self.artifacts.delete(kind, id).await? {
            Ok(1)
        } else {
            debug!(id, "Artifact already absent");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{NewDanger, NewRain, NewWind, WindKind};
    use bytes::Bytes;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    fn setup() -> (Pruner, FjallLedger, ArtifactStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FjallLedger::open(temp_dir.path().join("ledger")).unwrap();
        let artifacts = ArtifactStore::in_memory();
        let pruner = Pruner::new(ledger.clone(), artifacts.clone(), RetentionPolicy::default());
        (pruner, ledger, artifacts, temp_dir)
    }

    async fn store(artifacts: &ArtifactStore, kind: ArtifactKind, id: &str) {
        let pending = artifacts
            .write_temp(kind, Bytes::from_static(b"{}"))
            .await
            .unwrap();
        artifacts.commit(pending, id).await.unwrap();
    }

    #[tokio::test]
    async fn test_radar_pruned_by_age() {
        let (pruner, ledger, artifacts, _temp) = setup();
        let old = ledger
            .insert_rain(NewRain::radar(now() - TimeDelta::hours(25)))
            .unwrap();
        let fresh = ledger
            .insert_rain(NewRain::radar(now() - TimeDelta::hours(1)))
            .unwrap();
        store(&artifacts, ArtifactKind::Geometry, &old.id).await;
        store(&artifacts, ArtifactKind::Geometry, &fresh.id).await;

        let stats = pruner.run(now()).await.unwrap();
        assert_eq!(stats.radar, CategoryStats { records: 1, files: 1 });

        assert!(ledger.get_rain(&old.id).unwrap().is_none());
        assert!(!artifacts.exists(ArtifactKind::Geometry, &old.id).await.unwrap());
        assert!(ledger.get_rain(&fresh.id).unwrap().is_some());
        assert!(artifacts.exists(ArtifactKind::Geometry, &fresh.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_artifact_does_not_fail() {
        let (pruner, ledger, _artifacts, _temp) = setup();
        let old = ledger
            .insert_rain(NewRain::radar(now() - TimeDelta::hours(30)))
            .unwrap();

        let stats = pruner.run(now()).await.unwrap();
        assert_eq!(stats.radar, CategoryStats { records: 1, files: 0 });
        assert!(ledger.get_rain(&old.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_superseded_predictions_pruned_regardless_of_time() {
        let (pruner, ledger, _artifacts, _temp) = setup();
        let v1 = now() - TimeDelta::hours(3);
        let v2 = now() - TimeDelta::hours(1);
        let future = now() + TimeDelta::hours(5);

        let stale = ledger.insert_rain(NewRain::prediction(future, v1)).unwrap();
        let current = ledger.insert_rain(NewRain::prediction(future, v2)).unwrap();

        let stats = pruner.run(now()).await.unwrap();
        assert_eq!(stats.predictions.records, 1);
        assert!(ledger.get_rain(&stale.id).unwrap().is_none());
        assert!(ledger.get_rain(&current.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_wind_pruned_by_age_and_version() {
        let (pruner, ledger, artifacts, _temp) = setup();
        let v1 = now() - TimeDelta::hours(12);
        let v2 = now() - TimeDelta::hours(6);

        let old_run = ledger
            .insert_wind(NewWind {
                timestamp: now() + TimeDelta::hours(2),
                kind: WindKind::Direction,
                version: v1,
            })
            .unwrap();
        let expired = ledger
            .insert_wind(NewWind {
                timestamp: now() - TimeDelta::hours(30),
                kind: WindKind::Strength,
                version: v1,
            })
            .unwrap();
        let kept = ledger
            .insert_wind(NewWind {
                timestamp: now() + TimeDelta::hours(2),
                kind: WindKind::Strength,
                version: v2,
            })
            .unwrap();
        store(&artifacts, ArtifactKind::Image, &old_run.id).await;

        let stats = pruner.run(now()).await.unwrap();
        assert_eq!(stats.wind, CategoryStats { records: 2, files: 1 });
        assert!(ledger.get_wind(&old_run.id).unwrap().is_none());
        assert!(ledger.get_wind(&expired.id).unwrap().is_none());
        assert!(ledger.get_wind(&kept.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_danger_pruned_by_age() {
        let (pruner, ledger, _artifacts, _temp) = setup();
        let rain = ledger.insert_rain(NewRain::radar(now())).unwrap();
        let wind = ledger
            .insert_wind(NewWind {
                timestamp: now(),
                kind: WindKind::Strength,
                version: now(),
            })
            .unwrap();
        ledger
            .insert_danger(NewDanger {
                timestamp: now() - TimeDelta::hours(48),
                rain: rain.clone(),
                wind: wind.clone(),
            })
            .unwrap();
        ledger
            .insert_danger(NewDanger {
                timestamp: now(),
                rain,
                wind,
            })
            .unwrap();

        let stats = pruner.run(now()).await.unwrap();
        assert_eq!(stats.danger.records, 1);
        assert_eq!(ledger.stats().unwrap().danger_count, 1);
    }

    #[tokio::test]
    async fn test_prune_bookkeeping() {
        let (pruner, ledger, _artifacts, _temp) = setup();
        let interval = TimeDelta::hours(1);
        assert!(pruner.is_due(now(), interval).unwrap());

        let stats = pruner.run(now()).await.unwrap();
        assert_eq!(stats.records(), 0);
        assert_eq!(ledger.last_prune().unwrap(), Some(now()));

        assert!(!pruner.is_due(now() + TimeDelta::minutes(30), interval).unwrap());
        assert!(pruner.is_due(now() + interval, interval).unwrap());
    }
}
