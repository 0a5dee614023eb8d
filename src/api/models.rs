//! Request and response types of the read API
//!
//! Every product endpoint takes the same slot query:
//!
//! - `?five_minutes=N` selects the current five-minute slot plus `N` slots
//!   (negative values look back)
//! - `?at=2024-05-01T12:05:00Z` selects an explicit slot
//!
//! Product bodies are returned as stored: GeoJSON for rain, wind speed and
//! danger, PNG for wind direction.

use serde::{Deserialize, Serialize};

use crate::observability::MetricsSnapshot;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SlotQuery {
    pub five_minutes: Option<i64>,
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub rain_records: usize,
    pub wind_records: usize,
    pub danger_records: usize,
    pub metrics: MetricsSnapshot,
}
