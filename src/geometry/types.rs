use serde::{Deserialize, Serialize};

/// `[longitude, latitude]` in decimal degrees
pub type Position = [f64; 2];
pub type Ring = Vec<Position>;
pub type Polygon = Vec<Ring>;

/// Raw provider payload: a coordinate grid plus coloured areas of encoded shapes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderPayload {
    pub coords: GridDescriptor,
    #[serde(default)]
    pub areas: Vec<Area>,
}

/// Swiss-grid extent (kilometres) and cell counts of the encoding grid
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct GridDescriptor {
    pub x_min: f64,
    pub x_max: f64,
    pub x_count: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub y_count: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Area {
    /// Hex colour, usually without the leading `#`
    pub color: String,
    /// Each shape is a list of ring descriptors; the first ring is the outline
    #[serde(default)]
    pub shapes: Vec<Vec<EncodedRing>>,
}

/// One delta-encoded ring
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncodedRing {
    /// Starting x grid index
    pub i: i64,
    /// Starting y grid index
    pub j: i64,
    /// One decimal digit per vertex: sub-cell offset
    pub o: String,
    /// Two characters per step: x and y index increments biased by 77
    pub d: String,
    /// Severity band
    pub l: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// GeoJSON FeatureCollection as stored in artifacts
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: CollectionType,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(color: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            kind: FeatureType::Feature,
            properties: FeatureProperties {
                color: color.into(),
            },
            geometry,
        }
    }

    pub fn color(&self) -> &str {
        &self.properties.color
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureProperties {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_serializes_as_geojson() {
        let feature = Feature::new(
            "#ff0000",
            Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
        );
        let collection = FeatureCollection::new(vec![feature]);

        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["properties"]["color"], "#ff0000");
        assert_eq!(value["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(value["features"][0]["geometry"]["coordinates"][0][1][0], 1.0);
    }

    #[test]
    fn test_payload_parses_provider_shape() {
        let raw = r#"{
            "coords": {"x_min": 255, "x_max": 965, "x_count": 710, "y_min": -160, "y_max": 480, "y_count": 640},
            "areas": [{"color": "9a7e95", "shapes": [[{"i": 10, "j": 12, "o": "55", "d": "OM", "l": 0}]]}]
        }"#;

        let payload: ProviderPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.areas.len(), 1);
        assert_eq!(payload.areas[0].shapes[0][0].d, "OM");
        assert_eq!(payload.coords.x_count, 710.0);
    }
}
