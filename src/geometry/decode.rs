use super::error::{DecodeError, Result};
use super::projection::swiss_to_wgs84;
use super::types::{
    Area, EncodedRing, Feature, FeatureCollection, Geometry, GridDescriptor, Polygon,
    ProviderPayload, Ring,
};

/// Bias added by the provider to every delta character
const DELTA_BIAS: i64 = 77;

/// Colour given to secondary rings of a single-ring area (holes)
pub const HOLE_COLOR: &str = "#ffffff";

/// Decode a raw provider response body into a FeatureCollection
pub fn decode_bytes(body: &[u8]) -> Result<FeatureCollection> {
    let payload: ProviderPayload = serde_json::from_slice(body)?;
    decode_payload(&payload)
}

/// Decode a parsed provider payload into a FeatureCollection
///
/// Bands are emitted in ascending severity starting at level 0. When the first
/// area carries multi-ring shapes every band becomes one MultiPolygon per area;
/// otherwise every ring becomes its own Polygon feature.
pub fn decode_payload(payload: &ProviderPayload) -> Result<FeatureCollection> {
    validate_grid(&payload.coords)?;

    let multi = payload
        .areas
        .first()
        .is_some_and(|area| area.shapes.iter().any(|shape| shape.len() > 1));

    let features = if multi {
        assemble_multi(&payload.areas, &payload.coords)?
    } else {
        assemble_single(&payload.areas, &payload.coords)?
    };

    Ok(FeatureCollection::new(features))
}

fn validate_grid(grid: &GridDescriptor) -> Result<()> {
    if grid.x_count <= 0.0 || grid.y_count <= 0.0 {
        return Err(DecodeError::InvalidGrid {
            x_count: grid.x_count,
            y_count: grid.y_count,
        });
    }
    Ok(())
}

fn assemble_multi(areas: &[Area], grid: &GridDescriptor) -> Result<Vec<Feature>> {
    let mut features = Vec::new();
    let mut level = 0;

    loop {
        for area in areas {
            let mut polygons = Vec::new();
            for shape in area.shapes.iter().filter(|s| shape_level(s) == Some(level)) {
                let polygon = decode_shape(shape, grid)?;
                if !polygon.is_empty() {
                    polygons.push(polygon);
                }
            }

            if !polygons.is_empty() {
                features.push(Feature::new(
                    area_color(area),
                    Geometry::MultiPolygon(polygons),
                ));
            }
        }

        let next = areas
            .iter()
            .flat_map(|area| area.shapes.iter().filter_map(|s| shape_level(s)))
            .filter(|&l| l > level)
            .min();

        match next {
            Some(next) => level = next,
            None => break,
        }
    }

    Ok(features)
}

fn assemble_single(areas: &[Area], grid: &GridDescriptor) -> Result<Vec<Feature>> {
    let mut features = Vec::new();
    let mut level = 0;

    loop {
        let mut next: Option<i64> = None;

        for area in areas {
            for shape in &area.shapes {
                for (position, ring) in shape.iter().enumerate() {
                    if ring.l == level {
                        let coordinates = decode_ring(ring, grid)?;
                        if coordinates.is_empty() {
                            continue;
                        }
                        let color = if position == 0 {
                            area_color(area)
                        } else {
                            HOLE_COLOR.to_string()
                        };
                        features.push(Feature::new(color, Geometry::Polygon(vec![coordinates])));
                    } else if ring.l > level && next.is_none_or(|n| ring.l < n) {
                        next = Some(ring.l);
                    }
                }
            }
        }

        match next {
            Some(n) => level = n,
            None => break,
        }
    }

    Ok(features)
}

fn shape_level(shape: &[EncodedRing]) -> Option<i64> {
    shape.first().map(|ring| ring.l)
}

fn area_color(area: &Area) -> String {
    if area.color.starts_with('#') {
        area.color.clone()
    } else {
        format!("#{}", area.color)
    }
}

/// Decode an outline plus holes; a degenerate outline drops the whole polygon
fn decode_shape(shape: &[EncodedRing], grid: &GridDescriptor) -> Result<Polygon> {
    let mut polygon = Vec::with_capacity(shape.len());

    for (position, ring) in shape.iter().enumerate() {
        let coordinates = decode_ring(ring, grid)?;
        if coordinates.is_empty() {
            if position == 0 {
                return Ok(Vec::new());
            }
            continue;
        }
        polygon.push(coordinates);
    }

    Ok(polygon)
}

/// Walk one encoded ring and return a closed, counter-clockwise WGS84 ring
///
/// Returns an empty ring when fewer than four vertices remain after closing.
pub fn decode_ring(ring: &EncodedRing, grid: &GridDescriptor) -> Result<Ring> {
    if !ring.d.is_ascii() || ring.d.len() % 2 != 0 {
        return Err(DecodeError::InvalidDeltas(ring.d.clone()));
    }
    let deltas = ring.d.as_bytes();

    let mut x_index = ring.i;
    let mut y_index = ring.j;
    let mut coordinates: Ring = Vec::with_capacity(ring.o.len() + 1);

    for (step, digit) in ring.o.chars().enumerate() {
        let digit = digit
            .to_digit(10)
            .ok_or_else(|| DecodeError::InvalidOffset(ring.o.clone()))?;
        let offset = f64::from(digit) / 10.0 + 0.05;

        let (east, north) = grid_position(grid, x_index, y_index, offset);
        coordinates.push(swiss_to_wgs84(1e3 * east, 1e3 * north));

        if 2 * step < deltas.len() {
            x_index += i64::from(deltas[2 * step]) - DELTA_BIAS;
            y_index += i64::from(deltas[2 * step + 1]) - DELTA_BIAS;
        }
    }

    if coordinates.len() > 1 && coordinates.first() != coordinates.last() {
        coordinates.push(coordinates[0]);
    }

    if signed_area(&coordinates) < 0.0 {
        coordinates.reverse();
    }

    if coordinates.len() < 4 {
        coordinates.clear();
    }

    Ok(coordinates)
}

/// Even x indices sit on a vertical cell edge, so the sub-cell offset moves y;
/// odd indices sit on a horizontal edge and the offset moves x.
fn grid_position(grid: &GridDescriptor, x_index: i64, y_index: i64, offset: f64) -> (f64, f64) {
    let x_span = grid.x_max - grid.x_min;
    let y_span = grid.y_max - grid.y_min;
    let x = x_index as f64;
    let y = y_index as f64;

    if x_index.rem_euclid(2) == 0 {
        (
            grid.x_min + x_span * (x / 2.0) / grid.x_count,
            grid.y_min + y_span * ((y - 1.0) / 2.0 + offset) / grid.y_count,
        )
    } else {
        (
            grid.x_min + x_span * ((x - 1.0) / 2.0 + offset) / grid.x_count,
            grid.y_min + y_span * (y / 2.0) / grid.y_count,
        )
    }
}

/// Twice the signed shoelace area; positive for counter-clockwise rings
pub fn signed_area(ring: &[[f64; 2]]) -> f64 {
    ring.windows(2)
        .map(|pair| pair[0][0] * pair[1][1] - pair[1][0] * pair[0][1])
        .sum()
}
