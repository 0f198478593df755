//! GeoJSON text output.
//!
//! Collections are serialized through the `geojson` crate's types, so
//! property order (with `serde_json`'s `preserve_order`), feature-level
//! `id`/`bbox`, and foreign members survive the round trip.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use geojson::GeoJson;
use geoslim_core::FeatureCollection;

use crate::ExportError;

/// Serialize a collection as compact GeoJSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails, which only
/// happens for non-finite coordinates.
pub fn to_geojson(collection: &FeatureCollection) -> Result<String, ExportError> {
    Ok(serde_json::to_string(&collection.to_geojson())?)
}

/// Serialize a collection as indented GeoJSON.
///
/// # Errors
///
/// See [`to_geojson`].
pub fn to_geojson_pretty(collection: &FeatureCollection) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&collection.to_geojson())?)
}

/// Serialize an arbitrary GeoJSON document as indented text.
///
/// # Errors
///
/// See [`to_geojson`].
pub fn document_to_string(document: &GeoJson) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(document)?)
}
