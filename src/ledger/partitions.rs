/// Key layout and encoding utilities for Fjall partitions
///
/// Partition structure:
/// - `rain`:   rain:{id}   -> RainRecord (JSON)
/// - `wind`:   wind:{id}   -> WindRecord (JSON)
/// - `danger`: danger:{id} -> DangerRecord (JSON)
/// - `index`:  secondary keys below -> record id
///   - rain:{kind}:{ts}:{version}:{id}     (at most one radar entry per ts)
///   - rainver:{version}:{id}                 (predictions only)
///   - wind:{kind}:{version}:{ts}:{id}
///   - windver:{version}:{id}
///   - windts:{ts}:{id}
///   - danger:{ts}:{id}
///   - dangeruniq:{ts}:{rain_id}:{wind_id}   (uniqueness constraint)
/// - `metadata`: meta:{key} -> value (string)
///
/// Timestamps are zero-padded epoch milliseconds so lexicographic order is
/// chronological order; radar slices use an all-zero version.
use chrono::{DateTime, Utc};

use super::records::{RainKind, WindKind};

pub const RAIN_VERSION_PREFIX: &str = "rainver:";
pub const WIND_VERSION_PREFIX: &str = "windver:";
pub const WIND_TIME_PREFIX: &str = "windts:";
pub const DANGER_TIME_PREFIX: &str = "danger:";

/// Encode a timestamp as a fixed-width sortable string
pub fn encode_ts(ts: &DateTime<Utc>) -> String {
    format!("{:020}", ts.timestamp_millis())
}

fn encode_version(version: Option<&DateTime<Utc>>) -> String {
    version.map(encode_ts).unwrap_or_else(|| format!("{:020}", 0))
}

pub fn encode_rain_key(id: &str) -> Vec<u8> {
    format!("rain:{}", id).into_bytes()
}

pub fn encode_wind_key(id: &str) -> Vec<u8> {
    format!("wind:{}", id).into_bytes()
}

pub fn encode_danger_key(id: &str) -> Vec<u8> {
    format!("danger:{}", id).into_bytes()
}

pub fn rain_index_key(
    kind: RainKind,
    ts: &DateTime<Utc>,
    version: Option<&DateTime<Utc>>,
    id: &str,
) -> Vec<u8> {
    format!(
        "rain:{}:{}:{}:{}",
        kind.as_str(),
        encode_ts(ts),
        encode_version(version),
        id
    )
    .into_bytes()
}

pub fn rain_kind_prefix(kind: RainKind) -> Vec<u8> {
    format!("rain:{}:", kind.as_str()).into_bytes()
}

pub fn rain_slot_prefix(kind: RainKind, ts: &DateTime<Utc>) -> Vec<u8> {
    format!("rain:{}:{}:", kind.as_str(), encode_ts(ts)).into_bytes()
}

pub fn prediction_slot_prefix(ts: &DateTime<Utc>, version: &DateTime<Utc>) -> Vec<u8> {
    format!(
        "rain:{}:{}:{}:",
        RainKind::Prediction.as_str(),
        encode_ts(ts),
        encode_ts(version)
    )
    .into_bytes()
}

pub fn rain_version_key(version: &DateTime<Utc>, id: &str) -> Vec<u8> {
    format!("{}{}:{}", RAIN_VERSION_PREFIX, encode_ts(version), id).into_bytes()
}

pub fn wind_index_key(
    kind: WindKind,
    version: &DateTime<Utc>,
    ts: &DateTime<Utc>,
    id: &str,
) -> Vec<u8> {
    format!(
        "wind:{}:{}:{}:{}",
        kind.as_str(),
        encode_ts(version),
        encode_ts(ts),
        id
    )
    .into_bytes()
}

pub fn wind_series_prefix(kind: WindKind, version: &DateTime<Utc>) -> Vec<u8> {
    format!("wind:{}:{}:", kind.as_str(), encode_ts(version)).into_bytes()
}

pub fn wind_slot_prefix(kind: WindKind, version: &DateTime<Utc>, ts: &DateTime<Utc>) -> Vec<u8> {
    format!(
        "wind:{}:{}:{}:",
        kind.as_str(),
        encode_ts(version),
        encode_ts(ts)
    )
    .into_bytes()
}

pub fn wind_version_key(version: &DateTime<Utc>, id: &str) -> Vec<u8> {
    format!("{}{}:{}", WIND_VERSION_PREFIX, encode_ts(version), id).into_bytes()
}

pub fn wind_time_key(ts: &DateTime<Utc>, id: &str) -> Vec<u8> {
    format!("{}{}:{}", WIND_TIME_PREFIX, encode_ts(ts), id).into_bytes()
}

pub fn danger_time_key(ts: &DateTime<Utc>, id: &str) -> Vec<u8> {
    format!("{}{}:{}", DANGER_TIME_PREFIX, encode_ts(ts), id).into_bytes()
}

pub fn danger_slot_prefix(ts: &DateTime<Utc>) -> Vec<u8> {
    format!("{}{}:", DANGER_TIME_PREFIX, encode_ts(ts)).into_bytes()
}

pub fn danger_unique_key(ts: &DateTime<Utc>, rain_id: &str, wind_id: &str) -> Vec<u8> {
    format!("dangeruniq:{}:{}:{}", encode_ts(ts), rain_id, wind_id).into_bytes()
}

/// Exclusive upper bound selecting every key under `prefix` older than `cutoff`
pub fn time_bound(prefix: &str, cutoff: &DateTime<Utc>) -> Vec<u8> {
    format!("{}{}", prefix, encode_ts(cutoff)).into_bytes()
}

/// Encode a metadata key: meta:{key}
pub fn encode_meta_key(key: &str) -> Vec<u8> {
    format!("meta:{}", key).into_bytes()
}
