use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::commit::SliceOutcome;
use super::error::Result;
use super::{Acquisition, SourceReport};
use crate::ledger::NewRain;
use crate::slots;

impl Acquisition {
    /// Fetch every radar sweep between the latest stored one and `now`
    ///
    /// Starts at midnight of the previous day on an empty ledger. Missing
    /// sweeps are skipped for good.
    pub async fn run_radar(&self, now: DateTime<Utc>) -> Result<SourceReport> {
        let cadence = self.settings.radar_cadence;
        let mut cursor = match self.ledger.latest_radar()? {
            Some(latest) => slots::floor(latest.timestamp, cadence) + cadence,
            None => slots::previous_midnight(now),
        };

        debug!(cursor = %cursor, now = %now, "Starting radar walk");
        let mut report = SourceReport::default();

        while cursor < now {
            let url = self.provider.radar_url(&cursor);
            let ts = cursor;
            cursor += cadence;

            let Some(body) = self.fetch_slice(&url).await else {
                report.skipped += 1;
                continue;
            };

            let outcome = self
                .commit_geometry(&url, &body, |ledger| {
                    Ok(ledger.insert_rain(NewRain::radar(ts))?.id)
                })
                .await?;

            match outcome {
                SliceOutcome::Stored(id) => {
                    debug!(timestamp = %ts, id, "Stored radar sweep");
                    report.stored += 1;
                }
                SliceOutcome::Skipped => report.skipped += 1,
            }
        }

        info!(
            product = "radar",
            stored = report.stored,
            skipped = report.skipped,
            "Radar walk complete"
        );
        Ok(report)
    }
}
