//! Swiss grid (LV03 / LV95) to WGS84 approximation
//!
//! Uses the published polynomial approximation rather than a full geodetic
//! transform; accuracy is in the order of a metre across Switzerland, which is
//! far below the resolution of the radar products.

use super::types::Position;

/// LV95 false easting/northing added on top of LV03
const LV95_EAST_OFFSET: f64 = 2_000_000.0;
const LV95_NORTH_OFFSET: f64 = 1_000_000.0;

/// LV03 coordinates of the projection origin (old observatory, Bern)
const ORIGIN_EAST: f64 = 600_000.0;
const ORIGIN_NORTH: f64 = 200_000.0;

/// The polynomials produce units of 10000" (arc seconds); scale to degrees
const TO_DEGREES: f64 = 100.0 / 36.0;

/// Strip the LV95 offsets so both grid generations share the LV03 origin
fn to_lv03(east: f64, north: f64) -> (f64, f64) {
    let east = if east >= LV95_EAST_OFFSET {
        east - LV95_EAST_OFFSET
    } else {
        east
    };
    let north = if north >= LV95_NORTH_OFFSET {
        north - LV95_NORTH_OFFSET
    } else {
        north
    };
    (east, north)
}

/// Convert Swiss grid metres to `[longitude, latitude]`
pub fn swiss_to_wgs84(east: f64, north: f64) -> Position {
    let (east, north) = to_lv03(east, north);
    let i = (east - ORIGIN_EAST) / 1e6;
    let r = (north - ORIGIN_NORTH) / 1e6;

    let lng = 2.6779094 + 4.728982 * i + 0.791484 * i * r + 0.1306 * i * r.powi(2)
        - 0.0436 * i.powi(3);
    let lat = 16.9023892 + 3.238272 * r
        - 0.270978 * i.powi(2)
        - 0.002528 * r.powi(2)
        - 0.0447 * i.powi(2) * r
        - 0.014 * r.powi(3);

    [lng * TO_DEGREES, lat * TO_DEGREES]
}
