//! Vertex counting and reduction statistics.
//!
//! Only area-bearing geometry is counted: Polygon and `MultiPolygon`
//! contribute the length of every ring (closing point included), every
//! other geometry contributes zero.

use geo::Centroid;
use serde::{Deserialize, Serialize};

use crate::types::{Feature, Geometry, Point, Polygon};

/// Reduction above this percentage is flagged as too aggressive.
pub const TOO_AGGRESSIVE_ABOVE: f64 = 85.0;

/// Lower bound (inclusive) of the recommended reduction band.
pub const RECOMMENDED_MIN: f64 = 50.0;

/// Upper bound (inclusive) of the recommended reduction band.
pub const RECOMMENDED_MAX: f64 = 80.0;

/// Total number of coordinates across all rings of a geometry.
#[must_use]
pub fn coordinate_count(geometry: &Geometry) -> usize {
    match geometry {
        Geometry::Polygon(polygon) => polygon_coordinate_count(polygon),
        Geometry::MultiPolygon(multi) => multi.polygons().iter().map(polygon_coordinate_count).sum(),
        Geometry::Passthrough(_) => 0,
    }
}

fn polygon_coordinate_count(polygon: &Polygon) -> usize {
    polygon.rings().iter().map(crate::types::Ring::len).sum()
}

/// Total coordinates across a slice of features.
///
/// Features without a geometry contribute zero.
#[must_use]
pub fn total_coordinates(features: &[Feature]) -> usize {
    features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(coordinate_count)
        .sum()
}

/// Percentage of coordinates removed: `(original - simplified) / original * 100`.
///
/// Returns `0.0` when `original` is zero. The result is clamped to
/// `0.0..=100.0`, so a "simplified" count larger than the original
/// reads as no reduction.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reduction_percentage(original: usize, simplified: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let removed = original.saturating_sub(simplified);
    (removed as f64 / original as f64 * 100.0).clamp(0.0, 100.0)
}

/// Advisory classification of a reduction percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionBand {
    /// More than [`TOO_AGGRESSIVE_ABOVE`] percent removed: shapes are
    /// likely distorted.
    TooAggressive,
    /// Between [`RECOMMENDED_MIN`] and [`RECOMMENDED_MAX`] percent
    /// (inclusive).
    Recommended,
    /// Anything else.
    Neutral,
}

impl ReductionBand {
    /// Classify a reduction percentage.
    #[must_use]
    pub fn classify(reduction_pct: f64) -> Self {
        if reduction_pct > TOO_AGGRESSIVE_ABOVE {
            Self::TooAggressive
        } else if (RECOMMENDED_MIN..=RECOMMENDED_MAX).contains(&reduction_pct) {
            Self::Recommended
        } else {
            Self::Neutral
        }
    }

    /// A short message for the user, if this band warrants one.
    #[must_use]
    pub const fn advice(self) -> Option<&'static str> {
        match self {
            Self::TooAggressive => Some(
                "Reduction exceeds 85%. Consider lowering the tolerance to preserve shape better.",
            ),
            Self::Recommended => Some("Good reduction range (50-80%)"),
            Self::Neutral => None,
        }
    }
}

/// Before/after coordinate totals for a simplification run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReductionStats {
    /// Coordinates in the original polygonal geometry.
    pub original_points: usize,
    /// Coordinates after simplification.
    pub simplified_points: usize,
    /// Percentage removed, see [`reduction_percentage`].
    pub reduction_pct: f64,
}

impl ReductionStats {
    /// Compare two feature lists.
    #[must_use]
    pub fn compute(original: &[Feature], simplified: &[Feature]) -> Self {
        Self::from_counts(total_coordinates(original), total_coordinates(simplified))
    }

    /// Build stats from precomputed totals.
    #[must_use]
    pub fn from_counts(original_points: usize, simplified_points: usize) -> Self {
        Self {
            original_points,
            simplified_points,
            reduction_pct: reduction_percentage(original_points, simplified_points),
        }
    }

    /// The advisory band for this run.
    #[must_use]
    pub fn band(&self) -> ReductionBand {
        ReductionBand::classify(self.reduction_pct)
    }
}

/// A point to centre map views on: the centroid of the first feature's
/// geometry.
///
/// Returns `None` for an empty slice, a first feature without geometry,
/// or a geometry with no computable centroid (empty coordinates, or a
/// `GeometryCollection`).
#[must_use]
pub fn view_center(features: &[Feature]) -> Option<Point> {
    let centroid = match features.first()?.geometry.as_ref()? {
        Geometry::Polygon(polygon) => to_geo_polygon(polygon)?.centroid(),
        Geometry::MultiPolygon(multi) => multi
            .polygons()
            .iter()
            .map(to_geo_polygon)
            .collect::<Option<geo::MultiPolygon<f64>>>()?
            .centroid(),
        Geometry::Passthrough(geometry) => passthrough_centroid(&geometry.value),
    }?;
    Some(Point::new(centroid.x(), centroid.y()))
}

fn to_geo_polygon(polygon: &Polygon) -> Option<geo::Polygon<f64>> {
    let to_line_string = |ring: &crate::types::Ring| -> geo::LineString<f64> {
        ring.points()
            .iter()
            .map(|p| geo::Coord { x: p.x, y: p.y })
            .collect()
    };
    let exterior = to_line_string(polygon.exterior()?);
    let holes = polygon.holes().iter().map(to_line_string).collect();
    Some(geo::Polygon::new(exterior, holes))
}

fn passthrough_centroid(value: &geojson::Value) -> Option<geo::Point<f64>> {
    let coord = |p: &Vec<f64>| match p.as_slice() {
        [x, y, ..] => Some(geo::Coord { x: *x, y: *y }),
        _ => None,
    };
    let line_string = |ps: &Vec<Vec<f64>>| {
        ps.iter()
            .map(coord)
            .collect::<Option<geo::LineString<f64>>>()
    };
    match value {
        geojson::Value::Point(p) => coord(p).map(geo::Point::from),
        geojson::Value::MultiPoint(ps) => ps
            .iter()
            .map(|p| coord(p).map(geo::Point::from))
            .collect::<Option<geo::MultiPoint<f64>>>()?
            .centroid(),
        geojson::Value::LineString(ps) => line_string(ps)?.centroid(),
        geojson::Value::MultiLineString(lines) => lines
            .iter()
            .map(line_string)
            .collect::<Option<geo::MultiLineString<f64>>>()?
            .centroid(),
        geojson::Value::Polygon(_)
        | geojson::Value::MultiPolygon(_)
        | geojson::Value::GeometryCollection(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{MultiPolygon, Ring};

    fn unit_square() -> Ring {
        Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 0.0),
        ])
    }

    fn passthrough(value: geojson::Value) -> Geometry {
        Geometry::Passthrough(geojson::Geometry::new(value))
    }

    #[test]
    fn polygon_counts_every_ring_with_closing_point() {
        let polygon = Geometry::Polygon(Polygon::new(vec![unit_square(), unit_square()]));
        assert_eq!(coordinate_count(&polygon), 10);
    }

    #[test]
    fn multi_polygon_sums_members() {
        let multi = Geometry::MultiPolygon(MultiPolygon::new(vec![
            Polygon::new(vec![unit_square()]),
            Polygon::new(vec![unit_square(), unit_square()]),
        ]));
        assert_eq!(coordinate_count(&multi), 15);
    }

    #[test]
    fn other_geometry_counts_zero() {
        let line = passthrough(geojson::Value::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        ]));
        assert_eq!(coordinate_count(&line), 0);
        assert_eq!(coordinate_count(&Geometry::Polygon(Polygon::new(vec![]))), 0);
    }

    #[test]
    fn total_skips_missing_geometry() {
        let features = vec![
            Feature::new(Geometry::Polygon(Polygon::new(vec![unit_square()]))),
            Feature {
                geometry: None,
                ..Feature::new(Geometry::Polygon(Polygon::new(vec![])))
            },
        ];
        assert_eq!(total_coordinates(&features), 5);
    }

    #[test]
    fn reduction_zero_guard() {
        assert!((reduction_percentage(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((reduction_percentage(0, 10) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reduction_values() {
        assert!((reduction_percentage(100, 25) - 75.0).abs() < 1e-12);
        assert!((reduction_percentage(100, 100) - 0.0).abs() < f64::EPSILON);
        assert!((reduction_percentage(100, 0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reduction_never_negative() {
        assert!((reduction_percentage(10, 20) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(ReductionBand::classify(0.0), ReductionBand::Neutral);
        assert_eq!(ReductionBand::classify(49.9), ReductionBand::Neutral);
        assert_eq!(ReductionBand::classify(50.0), ReductionBand::Recommended);
        assert_eq!(ReductionBand::classify(65.0), ReductionBand::Recommended);
        assert_eq!(ReductionBand::classify(80.0), ReductionBand::Recommended);
        assert_eq!(ReductionBand::classify(82.0), ReductionBand::Neutral);
        assert_eq!(ReductionBand::classify(85.0), ReductionBand::Neutral);
        assert_eq!(ReductionBand::classify(85.1), ReductionBand::TooAggressive);
        assert_eq!(ReductionBand::classify(100.0), ReductionBand::TooAggressive);
    }

    #[test]
    fn band_advice() {
        assert!(ReductionBand::TooAggressive.advice().unwrap().contains("85%"));
        assert!(ReductionBand::Recommended.advice().unwrap().contains("50-80%"));
        assert!(ReductionBand::Neutral.advice().is_none());
    }

    #[test]
    fn band_serializes_snake_case() {
        let json = serde_json::to_string(&ReductionBand::TooAggressive).unwrap();
        assert_eq!(json, "\"too_aggressive\"");
    }

    #[test]
    fn stats_from_counts() {
        let stats = ReductionStats::from_counts(1000, 300);
        assert_eq!(stats.original_points, 1000);
        assert_eq!(stats.simplified_points, 300);
        assert!((stats.reduction_pct - 70.0).abs() < 1e-9);
        assert_eq!(stats.band(), ReductionBand::Recommended);
    }

    #[test]
    fn center_of_square() {
        let features = vec![Feature::new(Geometry::Polygon(Polygon::new(vec![
            unit_square(),
        ])))];
        let center = view_center(&features).unwrap();
        assert!((center.x - 0.5).abs() < 1e-12);
        assert!((center.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn center_of_point() {
        let features = vec![Feature::new(passthrough(geojson::Value::Point(vec![
            3.0, 4.0,
        ])))];
        assert_eq!(view_center(&features), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn center_of_nothing() {
        assert!(view_center(&[]).is_none());
        let empty = vec![Feature::new(Geometry::Polygon(Polygon::new(vec![])))];
        assert!(view_center(&empty).is_none());
    }
}
