//! Reading GeoJSON documents into the typed model and writing them back.
//!
//! Validation happens in a fixed order so each failure maps to exactly
//! one [`GeoslimError`] kind:
//!
//! 1. empty input -> [`GeoslimError::EmptyInput`]
//! 2. malformed JSON -> [`GeoslimError::Parse`]
//! 3. top-level `type` not Feature/FeatureCollection ->
//!    [`GeoslimError::UnsupportedType`]
//! 4. schema violations -> [`GeoslimError::InvalidGeoJson`]
//! 5. a feature geometry that cannot be read ->
//!    [`GeoslimError::InvalidGeometry`] with the feature's index

use geojson::GeoJson;
use serde_json::Value;

use crate::types::{
    Feature, FeatureCollection, GeoslimError, Geometry, JsonObject, MultiPolygon, Point, Polygon,
    Ring,
};

/// Parse raw document bytes into a GeoJSON value, accepting only a
/// Feature or a `FeatureCollection` at the top level.
///
/// Features are read one at a time so a geometry that fails to parse is
/// reported with the index of the feature that holds it.
///
/// # Errors
///
/// See the module documentation for the error produced at each step.
pub fn parse_geojson(bytes: &[u8]) -> Result<GeoJson, GeoslimError> {
    if bytes.is_empty() {
        return Err(GeoslimError::EmptyInput);
    }

    let value: Value = serde_json::from_slice(bytes)?;
    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err(GeoslimError::UnsupportedType(String::new())),
    };

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    match kind.as_str() {
        "Feature" => Ok(GeoJson::Feature(read_feature(Value::Object(object), 0)?)),
        "FeatureCollection" => {
            // Lift the features out so the collection's own members are
            // checked first. A non-array `features` stays in place for
            // `geojson` to reject.
            let features = match object.get_mut("features") {
                Some(Value::Array(features)) => std::mem::take(features),
                _ => Vec::new(),
            };
            let mut collection = geojson::FeatureCollection::from_json_object(object)?;
            collection.features = features
                .into_iter()
                .enumerate()
                .map(|(index, feature)| read_feature(feature, index))
                .collect::<Result<_, _>>()?;
            Ok(GeoJson::FeatureCollection(collection))
        }
        other => Err(GeoslimError::UnsupportedType(other.to_string())),
    }
}

/// Read the feature at `index`, attributing geometry errors to it.
fn read_feature(value: Value, index: usize) -> Result<geojson::Feature, GeoslimError> {
    let mut object = match value {
        Value::Object(object) => object,
        other => return Err(geojson::Error::GeoJsonExpectedObject(other).into()),
    };

    // Swap the geometry for null in place so member order is kept.
    let geometry = match object.get_mut("geometry") {
        Some(slot) => match std::mem::take(slot) {
            Value::Null => None,
            raw => Some(geojson::Geometry::from_json_value(raw).map_err(|e| {
                GeoslimError::InvalidGeometry {
                    feature: index,
                    reason: e.to_string(),
                }
            })?),
        },
        None => None,
    };

    let mut feature = geojson::Feature::from_json_object(object)?;
    feature.geometry = geometry;
    Ok(feature)
}

/// Parse raw document bytes into a flat, typed [`FeatureCollection`].
///
/// A single top-level Feature becomes a one-element collection.
///
/// # Errors
///
/// Returns any error from [`parse_geojson`], including
/// [`GeoslimError::InvalidGeometry`] naming the first feature whose
/// geometry cannot be read.
pub fn parse_document(bytes: &[u8]) -> Result<FeatureCollection, GeoslimError> {
    let collection = match parse_geojson(bytes)? {
        GeoJson::FeatureCollection(collection) => {
            let features = collection
                .features
                .into_iter()
                .enumerate()
                .map(|(index, feature)| Feature::from_geojson(feature, index))
                .collect::<Result<Vec<_>, _>>()?;
            FeatureCollection {
                features,
                foreign_members: collection.foreign_members,
            }
        }
        GeoJson::Feature(feature) => FeatureCollection::new(vec![Feature::from_geojson(feature, 0)?]),
        // parse_geojson has already rejected bare geometries.
        GeoJson::Geometry(geometry) => {
            return Err(GeoslimError::UnsupportedType(
                crate::types::geojson_kind(&geometry.value).to_string(),
            ));
        }
    };

    log::debug!("parsed document with {} features", collection.len());
    Ok(collection)
}

// ---------------------------------------------------------------------------
// GeoJSON -> typed model
// ---------------------------------------------------------------------------

impl Feature {
    /// Convert a GeoJSON feature into the typed model.
    ///
    /// `index` is the feature's position in its collection and is only
    /// used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`GeoslimError::InvalidGeometry`] if a Polygon or
    /// `MultiPolygon` has a position with fewer than two ordinates or a
    /// non-finite ordinate.
    pub fn from_geojson(feature: geojson::Feature, index: usize) -> Result<Self, GeoslimError> {
        let geometry = feature
            .geometry
            .map(Geometry::from_geojson)
            .transpose()
            .map_err(|reason| GeoslimError::InvalidGeometry {
                feature: index,
                reason,
            })?;

        Ok(Self {
            geometry,
            properties: feature.properties.unwrap_or_default(),
            id: feature.id,
            bbox: feature.bbox,
            foreign_members: feature.foreign_members,
        })
    }

    /// Convert back into a GeoJSON feature.
    ///
    /// An empty property map is written as `"properties": {}`, never
    /// `null`.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: self.bbox.clone(),
            geometry: self.geometry.as_ref().map(Geometry::to_geojson),
            id: self.id.clone(),
            properties: Some(self.properties.clone()),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

impl Geometry {
    /// Convert a GeoJSON geometry, keeping non-polygonal types verbatim.
    ///
    /// # Errors
    ///
    /// Returns a description of the first unreadable position.
    pub fn from_geojson(geometry: geojson::Geometry) -> Result<Self, String> {
        match geometry.value {
            geojson::Value::Polygon(rings) => Ok(Self::Polygon(polygon_from_positions(&rings)?)),
            geojson::Value::MultiPolygon(polygons) => Ok(Self::MultiPolygon(MultiPolygon::new(
                polygons
                    .iter()
                    .map(|rings| polygon_from_positions(rings))
                    .collect::<Result<_, _>>()?,
            ))),
            _ => Ok(Self::Passthrough(geometry)),
        }
    }

    /// Convert back into a GeoJSON geometry.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        match self {
            Self::Polygon(polygon) => {
                geojson::Geometry::new(geojson::Value::Polygon(polygon_to_positions(polygon)))
            }
            Self::MultiPolygon(multi) => geojson::Geometry::new(geojson::Value::MultiPolygon(
                multi.polygons().iter().map(polygon_to_positions).collect(),
            )),
            Self::Passthrough(geometry) => geometry.clone(),
        }
    }
}

impl FeatureCollection {
    /// Convert into a GeoJSON `FeatureCollection`.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members: self.foreign_members.clone(),
        }
    }
}

/// Read one GeoJSON position.
///
/// Ordinates past the second (elevation, measures) are discarded.
fn point_from_position(position: &[f64]) -> Result<Point, String> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Point::new(*x, *y)),
        [_, _, ..] => Err(format!("position {position:?} has a non-finite ordinate")),
        _ => Err(format!(
            "position {position:?} has {} ordinate(s), expected at least 2",
            position.len()
        )),
    }
}

fn polygon_from_positions(rings: &[Vec<Vec<f64>>]) -> Result<Polygon, String> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|position| point_from_position(position))
                .collect::<Result<Vec<_>, _>>()
                .map(Ring::new)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Polygon::new)
}

fn polygon_to_positions(polygon: &Polygon) -> Vec<Vec<Vec<f64>>> {
    polygon
        .rings()
        .iter()
        .map(|ring| ring.points().iter().map(|p| vec![p.x, p.y]).collect())
        .collect()
}

/// Build a property map from `(key, value)` pairs, preserving order.
///
/// Convenience for hosts and tests assembling features by hand.
#[must_use]
pub fn properties<K, V, I>(pairs: I) -> JsonObject
where
    K: Into<String>,
    V: Into<serde_json::Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
