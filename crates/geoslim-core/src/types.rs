//! Shared types for the geoslim document model.
//!
//! Polygonal geometry is held in owned, crate-local types so the
//! simplifier and metrics can match on it exhaustively. Every other
//! GeoJSON geometry is carried verbatim in [`Geometry::Passthrough`].

use serde::{Deserialize, Serialize};

/// Re-export the GeoJSON property map so downstream crates can build
/// features without depending on `geojson` directly.
pub use geojson::JsonObject;

/// Re-export the GeoJSON feature identifier.
pub use geojson::feature::Id as FeatureId;

/// A 2D coordinate in the input's reference system.
///
/// For RFC 7946 input this is `(longitude, latitude)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal ordinate (longitude).
    pub x: f64,
    /// Vertical ordinate (latitude).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A closed sequence of points bounding an area.
///
/// A valid ring repeats its first point as its last point, so a
/// triangle has four points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring(Vec<Point>);

impl Ring {
    /// Create a new ring from a vector of points.
    ///
    /// The points are taken as given; no closing point is appended.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the ring has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points, including the closing duplicate.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns `true` if the ring has at least two points and its last
    /// point equals its first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.len() >= 2 && self.first() == self.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the ring and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// A polygon: an exterior ring followed by zero or more holes.
///
/// An empty ring list is representable because GeoJSON permits
/// `"coordinates": []`; such polygons pass through every stage untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<Ring>,
}

impl Polygon {
    /// Create a polygon from its rings, exterior first.
    #[must_use]
    pub const fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// The exterior ring, if the polygon has any rings.
    #[must_use]
    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    /// The holes (every ring after the exterior).
    #[must_use]
    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or_default()
    }

    /// All rings, exterior first.
    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Consumes the polygon and returns its rings.
    #[must_use]
    pub fn into_rings(self) -> Vec<Ring> {
        self.rings
    }
}

/// An ordered collection of polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon(Vec<Polygon>);

impl MultiPolygon {
    /// Create a multi-polygon from its members.
    #[must_use]
    pub const fn new(polygons: Vec<Polygon>) -> Self {
        Self(polygons)
    }

    /// Returns a slice of all member polygons.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon] {
        &self.0
    }

    /// Consumes the multi-polygon and returns its members.
    #[must_use]
    pub fn into_polygons(self) -> Vec<Polygon> {
        self.0
    }
}

/// A feature geometry.
///
/// Only area-bearing geometry gets a typed representation; everything
/// else is an opaque, owned copy of the input GeoJSON geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A single polygon.
    Polygon(Polygon),
    /// A collection of polygons.
    MultiPolygon(MultiPolygon),
    /// Any other GeoJSON geometry (Point, LineString, `GeometryCollection`, ...).
    Passthrough(geojson::Geometry),
}

impl Geometry {
    /// The GeoJSON `type` name of this geometry.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
            Self::Passthrough(geometry) => geojson_kind(&geometry.value),
        }
    }

    /// Returns `true` for Polygon and `MultiPolygon`.
    #[must_use]
    pub const fn is_polygonal(&self) -> bool {
        matches!(self, Self::Polygon(_) | Self::MultiPolygon(_))
    }
}

/// GeoJSON `type` name of a geometry value.
pub(crate) const fn geojson_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// A geographic feature: a geometry plus its metadata.
///
/// Identity is positional within the containing [`FeatureCollection`];
/// `id` is carried along but never used to match features.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// The feature geometry, or `None` for `"geometry": null`.
    pub geometry: Option<Geometry>,
    /// Property map in document order.
    pub properties: JsonObject,
    /// Optional feature identifier.
    pub id: Option<FeatureId>,
    /// Optional bounding box of the feature.
    pub bbox: Option<Vec<f64>>,
    /// Members of the feature object outside the GeoJSON schema.
    pub foreign_members: Option<JsonObject>,
}

impl Feature {
    /// Create a feature with the given geometry and no properties.
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            properties: JsonObject::new(),
            id: None,
            bbox: None,
            foreign_members: None,
        }
    }

    /// Builder-style helper setting the property map.
    #[must_use]
    pub fn with_properties(mut self, properties: JsonObject) -> Self {
        self.properties = properties;
        self
    }
}

/// An ordered sequence of features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    /// The features, in document order.
    pub features: Vec<Feature>,
    /// Members of the collection object outside the GeoJSON schema.
    pub foreign_members: Option<JsonObject>,
}

impl FeatureCollection {
    /// Create a collection from a vector of features.
    #[must_use]
    pub const fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            foreign_members: None,
        }
    }

    /// Returns the number of features.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the collection has no features.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Configuration for a simplification run.
///
/// The tolerance is expressed in the input's coordinate units (degrees
/// for RFC 7946 GeoJSON). The `MIN`/`MAX`/`STEP` constants describe the
/// range an interactive host should offer; [`SimplifyConfig::validate`]
/// itself accepts any finite value, and a tolerance of zero or below
/// leaves every geometry untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Maximum perpendicular deviation of a discarded vertex.
    pub tolerance: f64,
}

impl SimplifyConfig {
    /// Default tolerance, in degrees (roughly 3 m at the equator).
    pub const DEFAULT_TOLERANCE: f64 = 0.000_03;

    /// Smallest tolerance offered to interactive users.
    pub const MIN_TOLERANCE: f64 = 0.000_01;

    /// Largest tolerance offered to interactive users.
    pub const MAX_TOLERANCE: f64 = 0.000_1;

    /// Slider increment between offered tolerances.
    pub const TOLERANCE_STEP: f64 = 0.000_01;

    /// Create a config with the given tolerance.
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Check that the config can drive a simplification run.
    ///
    /// # Errors
    ///
    /// Returns [`GeoslimError::InvalidConfig`] if the tolerance is NaN or
    /// infinite.
    pub fn validate(&self) -> Result<(), GeoslimError> {
        if self.tolerance.is_finite() {
            Ok(())
        } else {
            Err(GeoslimError::InvalidConfig(format!(
                "tolerance must be finite, got {}",
                self.tolerance
            )))
        }
    }

    /// Returns `true` when the tolerance removes nothing (zero or below).
    #[must_use]
    pub fn is_lossless(&self) -> bool {
        self.tolerance <= 0.0
    }

    /// Returns `true` if the tolerance lies within
    /// [`MIN_TOLERANCE`](Self::MIN_TOLERANCE)..=[`MAX_TOLERANCE`](Self::MAX_TOLERANCE).
    #[must_use]
    pub fn in_offered_range(&self) -> bool {
        (Self::MIN_TOLERANCE..=Self::MAX_TOLERANCE).contains(&self.tolerance)
    }
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }
}

/// Errors that can occur while reading, simplifying, or correcting a
/// document.
#[derive(Debug, thiserror::Error)]
pub enum GeoslimError {
    /// The input bytes were empty.
    #[error("input document is empty")]
    EmptyInput,

    /// The input is not well-formed JSON (or not UTF-8).
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The top-level object is neither a Feature nor a `FeatureCollection`.
    #[error("invalid GeoJSON type {0:?}: expected a FeatureCollection or Feature")]
    UnsupportedType(String),

    /// The JSON is well-formed but does not follow the GeoJSON schema.
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(#[from] geojson::Error),

    /// A feature's geometry cannot be read.
    #[error("invalid geometry in feature {feature}: {reason}")]
    InvalidGeometry {
        /// Position of the offending feature in the collection.
        feature: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Simplification configuration is invalid.
    #[error("invalid simplification configuration: {0}")]
    InvalidConfig(String),
}

impl GeoslimError {
    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::Parse(_) => "parse",
            Self::UnsupportedType(_) => "unsupported_type",
            Self::InvalidGeoJson(_) => "invalid_geojson",
            Self::InvalidGeometry { .. } => "invalid_geometry",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Serialized form of [`GeoslimError`].
///
/// `serde_json::Error` and `geojson::Error` do not implement serde
/// traits, so errors cross serialization boundaries as their kind and
/// `Display` message.
#[derive(Serialize)]
struct GeoslimErrorProxy<'a> {
    kind: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature: Option<usize>,
}

impl Serialize for GeoslimError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let feature = match self {
            Self::InvalidGeometry { feature, .. } => Some(*feature),
            _ => None,
        };
        GeoslimErrorProxy {
            kind: self.kind(),
            message: self.to_string(),
            feature,
        }
        .serialize(serializer)
    }
}
