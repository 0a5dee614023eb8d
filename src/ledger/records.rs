//! Typed records persisted in the ledger
//!
//! Records are immutable once written. `New*` values carry the caller-provided
//! fields; the ledger assigns ids and marks records processed on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::ArtifactKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RainKind {
    Radar,
    Prediction,
}

impl RainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RainKind::Radar => "radar",
            RainKind::Prediction => "prediction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindKind {
    Strength,
    Direction,
}

impl WindKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindKind::Strength => "strength",
            WindKind::Direction => "direction",
        }
    }

    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            WindKind::Strength => ArtifactKind::Geometry,
            WindKind::Direction => ArtifactKind::Image,
        }
    }
}

/// Radar sweep or precipitation forecast slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: RainKind,
    /// Production run; `None` for radar
    pub version: Option<DateTime<Utc>>,
    pub processed: bool,
}

impl RainRecord {
    pub fn artifact_kind(&self) -> ArtifactKind {
        ArtifactKind::Geometry
    }
}

/// Wind strength contours or wind direction image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: WindKind,
    pub version: DateTime<Utc>,
    pub processed: bool,
}

impl WindRecord {
    pub fn artifact_kind(&self) -> ArtifactKind {
        self.kind.artifact_kind()
    }
}

/// Composite hazard overlay derived from one rain and one wind slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub rain_id: String,
    pub wind_id: String,
    pub rain_version: Option<DateTime<Utc>>,
    pub wind_version: DateTime<Utc>,
}

impl DangerRecord {
    pub fn artifact_kind(&self) -> ArtifactKind {
        ArtifactKind::Geometry
    }
}

/// Rain record prior to insertion
///
/// Constructors keep radar slices unversioned and predictions versioned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRain {
    timestamp: DateTime<Utc>,
    kind: RainKind,
    version: Option<DateTime<Utc>>,
}

impl NewRain {
    pub fn radar(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind: RainKind::Radar,
            version: None,
        }
    }

    pub fn prediction(timestamp: DateTime<Utc>, version: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind: RainKind::Prediction,
            version: Some(version),
        }
    }

    pub(crate) fn into_record(self, id: String) -> RainRecord {
        RainRecord {
            id,
            timestamp: self.timestamp,
            kind: self.kind,
            version: self.version,
            processed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWind {
    pub timestamp: DateTime<Utc>,
    pub kind: WindKind,
    pub version: DateTime<Utc>,
}

impl NewWind {
    pub(crate) fn into_record(self, id: String) -> WindRecord {
        WindRecord {
            id,
            timestamp: self.timestamp,
            kind: self.kind,
            version: self.version,
            processed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDanger {
    pub timestamp: DateTime<Utc>,
    pub rain: RainRecord,
    pub wind: WindRecord,
}

impl NewDanger {
    pub(crate) fn into_record(self, id: String) -> DangerRecord {
        DangerRecord {
            id,
            timestamp: self.timestamp,
            rain_id: self.rain.id,
            wind_id: self.wind.id,
            rain_version: self.rain.version,
            wind_version: self.wind.version,
        }
    }
}

/// Outcome of the conditional danger insert
#[derive(Debug, Clone, PartialEq)]
pub enum DangerInsert {
    Inserted(DangerRecord),
    /// A record for the same (timestamp, rain, wind) triple already exists
    Duplicate { existing_id: String },
}
