//! Severity classification and the danger palette

use crate::geometry::Feature;

pub const WIND_CALM: [&str; 2] = ["#cccccc", "#ffffff"];
pub const WIND_MODERATE: &str = "#59cc00";
pub const WIND_SEVERE: &str = "#90cc00";

pub const RAIN_MODERATE: &str = "#9a7e95";
pub const RAIN_SEVERE: &str = "#0001fc";

pub const DANGER_CALM: &str = "#00ff00";
pub const DANGER_MODERATE: &str = "#ffff00";
pub const DANGER_SEVERE: &str = "#ff0000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Calm,
    Moderate,
    Severe,
}

impl Severity {
    pub fn danger_color(&self) -> &'static str {
        match self {
            Severity::Calm => DANGER_CALM,
            Severity::Moderate => DANGER_MODERATE,
            Severity::Severe => DANGER_SEVERE,
        }
    }
}

pub fn classify_wind(color: &str) -> Option<Severity> {
    if WIND_CALM.iter().any(|c| c.eq_ignore_ascii_case(color)) {
        Some(Severity::Calm)
    } else if WIND_MODERATE.eq_ignore_ascii_case(color) {
        Some(Severity::Moderate)
    } else if WIND_SEVERE.eq_ignore_ascii_case(color) {
        Some(Severity::Severe)
    } else {
        None
    }
}

/// Rain has no calm band; only moderate and severe precipitation count
pub fn classify_rain(color: &str) -> Option<Severity> {
    if RAIN_MODERATE.eq_ignore_ascii_case(color) {
        Some(Severity::Moderate)
    } else if RAIN_SEVERE.eq_ignore_ascii_case(color) {
        Some(Severity::Severe)
    } else {
        None
    }
}

/// Features split by severity, already recoloured to the danger palette
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub calm: Vec<Feature>,
    pub moderate: Vec<Feature>,
    pub severe: Vec<Feature>,
}

impl Buckets {
    /// Partition features with `classify`; unclassified features are dropped
    pub fn partition<F>(features: Vec<Feature>, classify: F) -> Self
    where
        F: Fn(&str) -> Option<Severity>,
    {
        let mut buckets = Self::default();
        for mut feature in features {
            let Some(severity) = classify(feature.color()) else {
                continue;
            };
            feature.properties.color = severity.danger_color().to_string();
            match severity {
                Severity::Calm => buckets.calm.push(feature),
                Severity::Moderate => buckets.moderate.push(feature),
                Severity::Severe => buckets.severe.push(feature),
            }
        }
        buckets
    }

    pub fn is_empty(&self) -> bool {
        self.calm.is_empty() && self.moderate.is_empty() && self.severe.is_empty()
    }
}

/// Layer rain and wind bands into one danger feature list
///
/// Order: the first calm wind feature, rain moderate, wind moderate, the
/// remaining calm wind features, rain severe, wind severe. The lone calm
/// feature up front is the renderer's base layer.
pub fn compose(wind: &Buckets, rain: &Buckets) -> Vec<Feature> {
    let (first_calm, rest_calm) = match wind.calm.split_first() {
        Some((first, rest)) => (Some(first), rest),
        None => (None, &[][..]),
    };

    first_calm
        .into_iter()
        .chain(&rain.moderate)
        .chain(&wind.moderate)
        .chain(rest_calm)
        .chain(&rain.severe)
        .chain(&wind.severe)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn feature(color: &str, x: f64) -> Feature {
        Feature::new(
            color,
            Geometry::Polygon(vec![vec![[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 0.0]]]),
        )
    }

    fn first_x(feature: &Feature) -> f64 {
        match &feature.geometry {
            Geometry::Polygon(polygon) => polygon[0][0][0],
            Geometry::MultiPolygon(polygons) => polygons[0][0][0][0],
        }
    }

    #[test]
    fn test_classification_ignores_case() {
        assert_eq!(classify_wind("#CCCCCC"), Some(Severity::Calm));
        assert_eq!(classify_wind("#ffffff"), Some(Severity::Calm));
        assert_eq!(classify_wind("#59CC00"), Some(Severity::Moderate));
        assert_eq!(classify_wind("#90cc00"), Some(Severity::Severe));
        assert_eq!(classify_wind("#123456"), None);

        assert_eq!(classify_rain("#9A7E95"), Some(Severity::Moderate));
        assert_eq!(classify_rain("#0001fc"), Some(Severity::Severe));
        assert_eq!(classify_rain("#cccccc"), None);
    }

    #[test]
    fn test_partition_recolors_and_drops_unknown() {
        let buckets = Buckets::partition(
            vec![
                feature("#cccccc", 0.0),
                feature("#59cc00", 1.0),
                feature("#abcdef", 2.0),
                feature("#90cc00", 3.0),
            ],
            classify_wind,
        );

        assert_eq!(buckets.calm.len(), 1);
        assert_eq!(buckets.moderate.len(), 1);
        assert_eq!(buckets.severe.len(), 1);
        assert_eq!(buckets.calm[0].color(), DANGER_CALM);
        assert_eq!(buckets.moderate[0].color(), DANGER_MODERATE);
        assert_eq!(buckets.severe[0].color(), DANGER_SEVERE);
    }

    #[test]
    fn test_compose_order() {
        let wind = Buckets::partition(
            vec![
                feature("#cccccc", 0.0),
                feature("#59cc00", 1.0),
                feature("#90cc00", 2.0),
                feature("#ffffff", 3.0),
            ],
            classify_wind,
        );
        let rain = Buckets::partition(
            vec![feature("#9a7e95", 10.0), feature("#0001fc", 11.0)],
            classify_rain,
        );

        let composed = compose(&wind, &rain);
        let order: Vec<f64> = composed.iter().map(first_x).collect();
        assert_eq!(order, vec![0.0, 10.0, 1.0, 3.0, 11.0, 2.0]);

        let colors: Vec<&str> = composed.iter().map(Feature::color).collect();
        assert_eq!(
            colors,
            vec![
                DANGER_CALM,
                DANGER_MODERATE,
                DANGER_MODERATE,
                DANGER_CALM,
                DANGER_SEVERE,
                DANGER_SEVERE
            ]
        );
    }

    #[test]
    fn test_compose_single_calm_feature() {
        let wind = Buckets::partition(
            vec![
                feature("#cccccc", 0.0),
                feature("#59cc00", 1.0),
                feature("#90cc00", 2.0),
            ],
            classify_wind,
        );
        let rain = Buckets::partition(
            vec![feature("#9a7e95", 10.0), feature("#0001fc", 11.0)],
            classify_rain,
        );

        // 1 calm + 2 moderate + 0 remaining calm + 2 severe
        let composed = compose(&wind, &rain);
        assert_eq!(composed.len(), 5);
        let order: Vec<f64> = composed.iter().map(first_x).collect();
        assert_eq!(order, vec![0.0, 10.0, 1.0, 11.0, 2.0]);

        let colors: Vec<&str> = composed.iter().map(Feature::color).collect();
        assert_eq!(
            colors,
            vec![
                DANGER_CALM,
                DANGER_MODERATE,
                DANGER_MODERATE,
                DANGER_SEVERE,
                DANGER_SEVERE
            ]
        );
    }

    #[test]
    fn test_compose_without_calm() {
        let wind = Buckets::partition(vec![feature("#90cc00", 0.0)], classify_wind);
        let rain = Buckets::partition(vec![feature("#9a7e95", 1.0)], classify_rain);

        let composed = compose(&wind, &rain);
        let order: Vec<f64> = composed.iter().map(first_x).collect();
        assert_eq!(order, vec![1.0, 0.0]);
    }
}
