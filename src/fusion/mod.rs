//! Danger fusion engine
//!
//! Each wind strength slice of the current wind run covers one hour. For every
//! five-minute tick in that hour the engine pairs it with the rain slice
//! effective at the tick and writes one danger overlay. The ledger's
//! `(timestamp, rain_id, wind_id)` uniqueness makes repeated runs no-ops.

pub mod error;
pub mod palette;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::geometry::{Feature, FeatureCollection};
use crate::ledger::{DangerInsert, FjallLedger, NewDanger, RainRecord, WindKind, WindRecord};
use crate::slots::{self, FIVE_MINUTES, ONE_HOUR};
use crate::storage::{ArtifactKind, ArtifactStore, StorageError};

pub use error::{FusionError, Result};
pub use palette::{Buckets, Severity, classify_rain, classify_wind, compose};

/// Counts from one fusion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusionReport {
    /// Fusion did not run because a forecast version is missing
    pub skipped: bool,
    pub wind_slices: usize,
    pub written: usize,
    /// Ticks already fused with the same rain and wind slices
    pub duplicates: usize,
    /// Ticks with no rain slice at all
    pub no_rain: usize,
    /// Records whose artifact is gone or unreadable
    pub broken: usize,
}

#[derive(Clone)]
pub struct FusionEngine {
    ledger: FjallLedger,
    artifacts: ArtifactStore,
}

impl FusionEngine {
    pub fn new(ledger: FjallLedger, artifacts: ArtifactStore) -> Self {
        Self { ledger, artifacts }
    }

    /// Fuse every wind strength slice of the current wind run with rain
    pub async fn run(&self) -> Result<FusionReport> {
        let mut report = FusionReport::default();

        let rain_version = self.ledger.rain_prediction_version()?;
        let Some(wind_version) = self.ledger.wind_version()? else {
            info!("No wind forecast stored, skipping fusion");
            report.skipped = true;
            return Ok(report);
        };
        if rain_version.is_none() {
            info!("No rain forecast stored, skipping fusion");
            report.skipped = true;
            return Ok(report);
        }

        let winds = self.ledger.wind_series(WindKind::Strength, &wind_version)?;
        debug!(version = %wind_version, slices = winds.len(), "Fusing wind run");

        for wind in winds {
            report.wind_slices += 1;
            self.fuse_wind(&wind, &mut report).await?;
        }

        info!(
            written = report.written,
            duplicates = report.duplicates,
            no_rain = report.no_rain,
            broken = report.broken,
            "Fusion complete"
        );
        Ok(report)
    }

    async fn fuse_wind(&self, wind: &WindRecord, report: &mut FusionReport) -> Result<()> {
        // Wind features are loaded on the first tick that needs them
        let mut wind_buckets: Option<Buckets> = None;
        let start = slots::floor(wind.timestamp, ONE_HOUR);

        for tick in slots::ticks(start, start + ONE_HOUR, FIVE_MINUTES) {
            let Some(rain) = self.ledger.rain_at(&tick)? else {
                report.no_rain += 1;
                continue;
            };

            if !self.artifacts.exists(rain.artifact_kind(), &rain.id).await? {
                error!(id = %rain.id, timestamp = %tick, "Rain record has no artifact");
                report.broken += 1;
                continue;
            }

            if self.ledger.danger_exists(&tick, &rain.id, &wind.id)? {
                report.duplicates += 1;
                continue;
            }

            if wind_buckets.is_none() {
                match self.load_features(wind.artifact_kind(), &wind.id).await? {
                    Some(features) => {
                        wind_buckets = Some(Buckets::partition(features, classify_wind));
                    }
                    None => {
                        error!(
                            id = %wind.id,
                            timestamp = %wind.timestamp,
                            "Wind record has no usable artifact"
                        );
                        report.broken += 1;
                        return Ok(());
                    }
                }
            }
            let Some(wind_features) = wind_buckets.as_ref() else {
                continue;
            };

            let rain_features = self.load_features(rain.artifact_kind(), &rain.id).await?;
            let Some(rain_features) = rain_features else {
                error!(id = %rain.id, timestamp = %tick, "Rain record has no usable artifact");
                report.broken += 1;
                continue;
            };
            let rain_buckets = Buckets::partition(rain_features, classify_rain);

            let overlay = FeatureCollection::new(compose(wind_features, &rain_buckets));
            if self.write_danger(tick, &rain, wind, &overlay).await? {
                report.written += 1;
            } else {
                report.duplicates += 1;
            }
        }
        Ok(())
    }

    /// Read a stored feature collection; `None` if the artifact is missing or
    /// not a feature collection
    async fn load_features(
        &self,
        kind: ArtifactKind,
        id: &str,
    ) -> Result<Option<Vec<Feature>>> {
        let body = match self.artifacts.read(kind, id).await {
            Ok(body) => body,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<FeatureCollection>(&body) {
            Ok(collection) => Ok(Some(collection.features)),
            Err(e) => {
                warn!(id, error = %e, "Stored artifact is not a feature collection");
                Ok(None)
            }
        }
    }

    /// Two-phase write of one danger overlay; false if another run won the slot
    async fn write_danger(
        &self,
        tick: DateTime<Utc>,
        rain: &RainRecord,
        wind: &WindRecord,
        overlay: &FeatureCollection,
    ) -> Result<bool> {
        let body = Bytes::from(serde_json::to_vec(overlay)?);
        let pending = self.artifacts.write_temp(ArtifactKind::Geometry, body).await?;

        let new = NewDanger {
            timestamp: tick,
            rain: rain.clone(),
            wind: wind.clone(),
        };
        let outcome = match self.ledger.insert_danger(new) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(discard) = self.artifacts.discard(pending).await {
                    warn!(error = %discard, "Failed to discard temporary artifact");
                }
                return Err(e.into());
            }
        };

        match outcome {
            DangerInsert::Inserted(record) => {
                self.artifacts.commit(pending, &record.id).await?;
                debug!(
                    id = %record.id,
                    timestamp = %tick,
                    features = overlay.features.len(),
                    "Stored danger overlay"
                );
                Ok(true)
            }
            DangerInsert::Duplicate { existing_id } => {
                debug!(existing_id, timestamp = %tick, "Danger overlay written concurrently");
                self.artifacts.discard(pending).await?;
                Ok(false)
            }
        }
    }
}
