//! Acquisition state machines
//!
//! One walker per source. Radar walks forward from the latest stored sweep;
//! rain and wind forecasts start a new walk over the forecast horizon whenever
//! the provider manifest announces a newer production run.
//!
//! A failed slice is skipped and logged, never retried within the walk. Only
//! store failures and manifest failures end a source's run early; the next
//! cycle resumes from what the ledger holds.

mod commit;
pub mod error;
mod forecast;
mod radar;

use chrono::{DateTime, TimeDelta, Utc};

use crate::ledger::FjallLedger;
use crate::provider::Provider;
use crate::slots::{FIVE_MINUTES, ONE_HOUR};
use crate::storage::ArtifactStore;

pub use error::{AcquisitionError, Result};

/// Cadences and horizon of the acquisition walks
#[derive(Debug, Clone)]
pub struct AcquisitionSettings {
    pub radar_cadence: TimeDelta,
    pub rain_cadence: TimeDelta,
    pub wind_cadence: TimeDelta,
    pub horizon: TimeDelta,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            radar_cadence: FIVE_MINUTES,
            rain_cadence: FIVE_MINUTES,
            wind_cadence: ONE_HOUR,
            horizon: TimeDelta::hours(48),
        }
    }
}

/// Outcome of one source's run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    /// Slices committed to ledger and artifact store
    pub stored: usize,
    /// Slices skipped after a fetch or decode failure
    pub skipped: usize,
    /// Production run walked in this cycle, if a new one was detected
    pub new_version: Option<DateTime<Utc>>,
}

impl SourceReport {
    pub fn has_new_data(&self) -> bool {
        self.stored > 0 || self.new_version.is_some()
    }
}

/// Drives the radar, rain and wind walks against one ledger and artifact store
#[derive(Clone)]
pub struct Acquisition {
    ledger: FjallLedger,
    artifacts: ArtifactStore,
    provider: Provider,
    settings: AcquisitionSettings,
}

impl Acquisition {
    pub fn new(
        ledger: FjallLedger,
        artifacts: ArtifactStore,
        provider: Provider,
        settings: AcquisitionSettings,
    ) -> Self {
        Self {
            ledger,
            artifacts,
            provider,
            settings,
        }
    }

    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }
}
