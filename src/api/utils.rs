//! API utility functions
//!
//! Pure helpers for turning a slot query into a validated timestamp.

use chrono::{DateTime, TimeDelta, Utc};

use super::models::SlotQuery;
use crate::api::error::ApiError;
use crate::slots::{self, FIVE_MINUTES};

/// Resolve a slot query against `now`
///
/// `at` takes an RFC 3339 timestamp; `five_minutes` is an offset in slots from
/// the current five-minute slot. No parameter means the current slot.
pub fn resolve_slot(query: &SlotQuery, now: DateTime<Utc>) -> Result<DateTime<Utc>, ApiError> {
    match (&query.at, query.five_minutes) {
        (Some(_), Some(_)) => Err(ApiError::InvalidSlot(
            "use either 'at' or 'five_minutes', not both".to_string(),
        )),
        (Some(at), None) => DateTime::parse_from_rfc3339(at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| {
                ApiError::InvalidSlot(format!("invalid 'at' timestamp {:?}: {}", at, e))
            }),
        (None, offset) => {
            let offset = offset.unwrap_or(0);
            offset
                .checked_mul(5)
                .and_then(TimeDelta::try_minutes)
                .and_then(|step| slots::floor(now, FIVE_MINUTES).checked_add_signed(step))
                .ok_or_else(|| ApiError::InvalidSlot(format!("offset out of range: {}", offset)))
        }
    }
}

/// Require `ts` to sit on a `step` boundary
pub fn require_aligned(ts: DateTime<Utc>, step: TimeDelta) -> Result<DateTime<Utc>, ApiError> {
    if slots::is_aligned(ts, step) {
        Ok(ts)
    } else {
        Err(ApiError::InvalidSlot(format!(
            "{} is not aligned to {} minutes",
            ts.to_rfc3339(),
            step.num_minutes()
        )))
    }
}
