use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use super::commit::SliceOutcome;
use super::error::{AcquisitionError, Result};
use super::{Acquisition, SourceReport};
use crate::ledger::{NewRain, NewWind, WindKind};
use crate::provider::Manifest;
use crate::slots;
use crate::storage::ArtifactKind;

/// Decide whether a manifest version starts a new walk
fn newer_version(
    product: &str,
    local: Option<DateTime<Utc>>,
    remote: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match local {
        None => Some(remote),
        Some(local) if remote > local => Some(remote),
        Some(local) if remote < local => {
            warn!(
                product,
                local = %local,
                remote = %remote,
                "Manifest version older than stored version, ignoring"
            );
            None
        }
        Some(_) => {
            debug!(product, version = %remote, "Forecast version unchanged");
            None
        }
    }
}

/// Forecast slots from one cadence after `now` up to the horizon
fn horizon(
    now: DateTime<Utc>,
    cadence: TimeDelta,
    span: TimeDelta,
) -> impl Iterator<Item = DateTime<Utc>> {
    let start = slots::floor(now, cadence);
    slots::ticks(start + cadence, start + span, cadence)
}

impl Acquisition {
    /// Fetch the provider manifest shared by the rain and wind walks of a cycle
    pub async fn manifest(&self) -> Result<Manifest> {
        self.provider
            .manifest()
            .await
            .map_err(AcquisitionError::Manifest)
    }

    /// Walk the precipitation forecast horizon if a new run was published
    pub async fn run_rain(&self, now: DateTime<Utc>, manifest: &Manifest) -> Result<SourceReport> {
        let local = self.ledger.rain_prediction_version()?;
        let remote = self
            .provider
            .rain_version(manifest)
            .map_err(AcquisitionError::Manifest)?;

        let Some(version) = newer_version("rain", local, remote) else {
            return Ok(SourceReport::default());
        };

        info!(product = "rain", version = %version, "New forecast version, starting walk");
        let mut report = SourceReport {
            new_version: Some(version),
            ..SourceReport::default()
        };

        for ts in horizon(now, self.settings.rain_cadence, self.settings.horizon) {
            let url = self.provider.rain_url(&version, &ts);
            let Some(body) = self.fetch_slice(&url).await else {
                report.skipped += 1;
                continue;
            };

            let outcome = self
                .commit_geometry(&url, &body, |ledger| {
                    Ok(ledger.insert_rain(NewRain::prediction(ts, version))?.id)
                })
                .await?;
            tally(&mut report, outcome, "rain", ts);
        }

        info!(
            product = "rain",
            version = %version,
            stored = report.stored,
            skipped = report.skipped,
            "Forecast walk complete"
        );
        Ok(report)
    }

    /// Walk the wind forecast horizon if a new run was published
    ///
    /// Strength contours are walked first, then direction images over the
    /// same slots.
    pub async fn run_wind(&self, now: DateTime<Utc>, manifest: &Manifest) -> Result<SourceReport> {
        let local = self.ledger.wind_version()?;
        let remote = self
            .provider
            .wind_version(manifest)
            .map_err(AcquisitionError::Manifest)?;

        let Some(version) = newer_version("wind", local, remote) else {
            return Ok(SourceReport::default());
        };

        info!(
            product = "wind",
            level = %self.provider.wind_level(),
            version = %version,
            "New forecast version, starting walk"
        );
        let mut report = SourceReport {
            new_version: Some(version),
            ..SourceReport::default()
        };

        for ts in horizon(now, self.settings.wind_cadence, self.settings.horizon) {
            let url = self.provider.wind_strength_url(&version, &ts);
            let Some(body) = self.fetch_slice(&url).await else {
                report.skipped += 1;
                continue;
            };

            let outcome = self
                .commit_geometry(&url, &body, |ledger| {
                    let new = NewWind {
                        timestamp: ts,
                        kind: WindKind::Strength,
                        version,
                    };
                    Ok(ledger.insert_wind(new)?.id)
                })
                .await?;
            tally(&mut report, outcome, "wind_strength", ts);
        }

        for ts in horizon(now, self.settings.wind_cadence, self.settings.horizon) {
            let url = self.provider.wind_direction_url(&version, &ts);
            let Some(body) = self.fetch_slice(&url).await else {
                report.skipped += 1;
                continue;
            };

            let outcome = self
                .commit(ArtifactKind::Image, body, |ledger| {
                    let new = NewWind {
                        timestamp: ts,
                        kind: WindKind::Direction,
                        version,
                    };
                    Ok(ledger.insert_wind(new)?.id)
                })
                .await?;
            tally(&mut report, outcome, "wind_direction", ts);
        }

        info!(
            product = "wind",
            version = %version,
            stored = report.stored,
            skipped = report.skipped,
            "Forecast walk complete"
        );
        Ok(report)
    }
}

fn tally(report: &mut SourceReport, outcome: SliceOutcome, product: &str, ts: DateTime<Utc>) {
    match outcome {
        SliceOutcome::Stored(id) => {
            debug!(product, timestamp = %ts, id, "Stored forecast slice");
            report.stored += 1;
        }
        SliceOutcome::Skipped => report.skipped += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_newer_version() {
        assert_eq!(newer_version("rain", None, ts(9, 0)), Some(ts(9, 0)));
        assert_eq!(newer_version("rain", Some(ts(8, 0)), ts(9, 0)), Some(ts(9, 0)));
        assert_eq!(newer_version("rain", Some(ts(9, 0)), ts(9, 0)), None);
        assert_eq!(newer_version("rain", Some(ts(9, 0)), ts(8, 0)), None);
    }

    #[test]
    fn test_horizon_starts_one_cadence_ahead() {
        let now = ts(10, 7);
        let all: Vec<_> = horizon(now, slots::FIVE_MINUTES, TimeDelta::hours(48)).collect();
        assert_eq!(all.first().copied(), Some(ts(10, 10)));
        assert_eq!(
            all.last().copied(),
            Some(ts(10, 5) + TimeDelta::hours(48) - slots::FIVE_MINUTES)
        );
        assert_eq!(all.len(), 48 * 12 - 1);
    }

    #[test]
    fn test_horizon_hourly() {
        let now = ts(10, 7);
        let all: Vec<_> = horizon(now, slots::ONE_HOUR, TimeDelta::hours(48)).collect();
        assert_eq!(all.first().copied(), Some(ts(11, 0)));
        assert_eq!(all.len(), 47);
    }
}
