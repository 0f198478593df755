//! geoslim-core: GeoJSON polygon simplification and field correction (sans-IO).
//!
//! Reads a GeoJSON Feature or `FeatureCollection`, reduces the vertex
//! count of every Polygon and `MultiPolygon` ring with a
//! topology-preserving Ramer-Douglas-Peucker pass, and reports how many
//! coordinates were removed. A separate corrector rewrites feature
//! metadata (drops `id`, renames `plot_id`/`country_code`).
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. File and browser
//! interaction lives in the `geoslim` CLI and `geoslim-wasm`.

pub mod correct;
pub mod diagnostics;
pub mod document;
pub mod metrics;
pub mod pipeline;
pub mod simplify;
pub mod types;

pub use correct::{CorrectionSummary, correct_bytes, correct_document};
pub use document::{parse_document, parse_geojson};
pub use metrics::{ReductionBand, ReductionStats};
pub use pipeline::{Pipeline, ProcessResult};
pub use types::{
    Feature, FeatureCollection, FeatureId, Geometry, GeoslimError, JsonObject, MultiPolygon,
    Point, Polygon, Ring, SimplifyConfig,
};

/// Parse, simplify, and measure a GeoJSON document in one call.
///
/// The original document is returned alongside the simplified one so
/// callers can display or compare both. Features keep their order,
/// properties, and identifiers; only Polygon and `MultiPolygon`
/// coordinates change.
///
/// # Steps
///
/// 1. Parse the bytes as a Feature or `FeatureCollection`
/// 2. Simplify every polygonal ring at `config.tolerance`
/// 3. Count coordinates before and after
///
/// # Errors
///
/// Returns [`GeoslimError::EmptyInput`] if `bytes` is empty.
/// Returns [`GeoslimError::Parse`] if the bytes are not JSON.
/// Returns [`GeoslimError::UnsupportedType`] for any other top-level type.
/// Returns [`GeoslimError::InvalidGeoJson`] or
/// [`GeoslimError::InvalidGeometry`] for schema violations.
/// Returns [`GeoslimError::InvalidConfig`] if the tolerance is not finite.
pub fn process(bytes: &[u8], config: &SimplifyConfig) -> Result<ProcessResult, GeoslimError> {
    config.validate()?;
    Ok(Pipeline::new(bytes.to_vec(), *config)
        .parse()?
        .simplify()?
        .measure()
        .into_result())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A closed ring of `n` points along a slightly wobbling square edge.
    fn wobbly_feature_collection() -> String {
        let mut coords = Vec::new();
        for i in 0..50 {
            let x = f64::from(i) * 0.0001;
            let y = if i % 2 == 0 { 0.0 } else { 0.000_001 };
            coords.push(format!("[{x}, {y}]"));
        }
        coords.push("[0.0049, 0.005]".to_string());
        coords.push("[0.0, 0.005]".to_string());
        coords.push("[0.0, 0.0]".to_string());
        format!(
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "id": "a", "properties": {{"plot_id": "A"}},
                  "geometry": {{"type": "Polygon", "coordinates": [[{}]]}}}}
            ]}}"#,
            coords.join(", ")
        )
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &SimplifyConfig::default());
        assert!(matches!(result, Err(GeoslimError::EmptyInput)));
    }

    #[test]
    fn process_rejects_bare_geometry() {
        let result = process(
            br#"{"type": "Point", "coordinates": [0, 0]}"#,
            &SimplifyConfig::default(),
        );
        assert!(matches!(result, Err(GeoslimError::UnsupportedType(t)) if t == "Point"));
    }

    #[test]
    fn process_rejects_infinite_tolerance() {
        let doc = wobbly_feature_collection();
        let result = process(doc.as_bytes(), &SimplifyConfig::new(f64::INFINITY));
        assert!(matches!(result, Err(GeoslimError::InvalidConfig(_))));
    }

    #[test]
    fn process_removes_wobble() {
        let doc = wobbly_feature_collection();
        let result = process(doc.as_bytes(), &SimplifyConfig::default()).unwrap();

        assert_eq!(result.stats.original_points, 53);
        assert!(result.stats.simplified_points < 10);
        assert!(result.stats.simplified_points >= simplify::MIN_RING_LEN);
        assert!(result.stats.reduction_pct > 80.0);

        let feature = &result.simplified.features[0];
        assert_eq!(feature.id, Some(FeatureId::String("a".to_string())));
        assert_eq!(feature.properties["plot_id"], "A");
    }

    #[test]
    fn process_keeps_original_intact() {
        let doc = wobbly_feature_collection();
        let result = process(doc.as_bytes(), &SimplifyConfig::default()).unwrap();
        assert_eq!(result.original, parse_document(doc.as_bytes()).unwrap());
    }

    #[test]
    fn process_single_feature_becomes_collection() {
        let doc = br#"{"type": "Feature", "properties": {},
            "geometry": {"type": "Polygon",
                "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]}}"#;
        let result = process(doc, &SimplifyConfig::default()).unwrap();
        assert_eq!(result.original.len(), 1);
        assert_eq!(result.simplified.len(), 1);
        assert_eq!(result.stats.original_points, 5);
        assert_eq!(result.stats.simplified_points, 5);
    }

    #[test]
    fn process_empty_collection() {
        let result = process(
            br#"{"type": "FeatureCollection", "features": []}"#,
            &SimplifyConfig::default(),
        )
        .unwrap();
        assert!(result.simplified.is_empty());
        assert!((result.stats.reduction_pct - 0.0).abs() < f64::EPSILON);
        assert!(result.center.is_none());
    }
}
