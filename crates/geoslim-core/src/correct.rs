//! Field correction: rewrite feature metadata into the target schema.
//!
//! For every feature the `id` member is removed and two property keys are
//! renamed:
//!
//! | from           | to                |
//! |----------------|-------------------|
//! | `plot_id`      | `ProductionPlace` |
//! | `country_code` | `ProducerCountry` |
//!
//! Geometry is never touched. A renamed key keeps its position in the
//! property map. If the target key already exists, the renamed value
//! replaces it and the map ends up with a single entry for that key.

use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::types::{GeoslimError, JsonObject};

/// Property keys renamed by the corrector, as `(from, to)` pairs.
pub const RENAMES: [(&str, &str); 2] = [
    ("plot_id", "ProductionPlace"),
    ("country_code", "ProducerCountry"),
];

/// What a correction pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionSummary {
    /// Number of features visited.
    pub features: usize,
    /// Number of features that had an `id` removed.
    pub ids_removed: usize,
    /// Number of property keys renamed.
    pub keys_renamed: usize,
}

/// Correct a single feature in place.
///
/// Returns the summary for this feature alone.
pub fn correct_feature(feature: &mut geojson::Feature) -> CorrectionSummary {
    let ids_removed = usize::from(feature.id.take().is_some());
    let keys_renamed = feature.properties.as_mut().map_or(0, rename_keys);
    CorrectionSummary {
        features: 1,
        ids_removed,
        keys_renamed,
    }
}

/// Correct every feature of a document.
///
/// Bare geometries have no feature metadata and are returned unchanged.
#[must_use]
pub fn correct_document(document: GeoJson) -> GeoJson {
    correct_document_with_summary(document).0
}

/// Like [`correct_document`], also reporting what changed.
#[must_use]
pub fn correct_document_with_summary(document: GeoJson) -> (GeoJson, CorrectionSummary) {
    let mut summary = CorrectionSummary::default();
    let document = match document {
        GeoJson::FeatureCollection(mut collection) => {
            for feature in &mut collection.features {
                summary.add(correct_feature(feature));
            }
            GeoJson::FeatureCollection(collection)
        }
        GeoJson::Feature(mut feature) => {
            summary.add(correct_feature(&mut feature));
            GeoJson::Feature(feature)
        }
        GeoJson::Geometry(geometry) => GeoJson::Geometry(geometry),
    };
    log::debug!(
        "corrected {} features: {} ids removed, {} keys renamed",
        summary.features,
        summary.ids_removed,
        summary.keys_renamed,
    );
    (document, summary)
}

/// Parse and correct raw document bytes.
///
/// # Errors
///
/// Returns the same errors as [`crate::document::parse_geojson`]: an
/// empty input, malformed JSON, a top-level type other than Feature or
/// `FeatureCollection`, a schema violation, or a feature geometry that
/// cannot be read.
pub fn correct_bytes(bytes: &[u8]) -> Result<(GeoJson, CorrectionSummary), GeoslimError> {
    let document = crate::document::parse_geojson(bytes)?;
    Ok(correct_document_with_summary(document))
}

impl CorrectionSummary {
    fn add(&mut self, other: Self) {
        self.features += other.features;
        self.ids_removed += other.ids_removed;
        self.keys_renamed += other.keys_renamed;
    }
}

/// Rename keys per [`RENAMES`], keeping each key's position.
///
/// Returns the number of keys renamed.
fn rename_keys(properties: &mut JsonObject) -> usize {
    let active: Vec<&str> = RENAMES
        .iter()
        .filter(|(from, _)| properties.contains_key(*from))
        .map(|&(_, to)| to)
        .collect();
    if active.is_empty() {
        return 0;
    }

    let original = std::mem::take(properties);
    for (key, value) in original {
        if let Some(&(_, to)) = RENAMES.iter().find(|(from, _)| *from == key) {
            properties.insert(to.to_string(), value);
        } else if active.contains(&key.as_str()) && properties.contains_key(&key) {
            // Already written by the rename; the renamed value wins.
        } else {
            properties.insert(key, value);
        }
    }
    active.len()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GeoJson {
        json.parse().unwrap()
    }

    fn keys(feature: &geojson::Feature) -> Vec<String> {
        feature
            .properties
            .as_ref()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn drops_id_and_renames_keys() {
        let doc = parse(
            r#"{"type": "Feature", "id": "abc",
                "properties": {"plot_id": "P1", "country_code": "KE"},
                "geometry": null}"#,
        );
        let (corrected, summary) = correct_document_with_summary(doc);
        let GeoJson::Feature(feature) = corrected else {
            panic!("expected a feature");
        };
        assert!(feature.id.is_none());
        let props = feature.properties.unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["ProductionPlace"], "P1");
        assert_eq!(props["ProducerCountry"], "KE");
        assert_eq!(
            summary,
            CorrectionSummary {
                features: 1,
                ids_removed: 1,
                keys_renamed: 2,
            }
        );
    }

    #[test]
    fn id_is_absent_from_serialized_output() {
        let doc = parse(r#"{"type": "Feature", "id": 7, "properties": {}, "geometry": null}"#);
        let text = correct_document(doc).to_string();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn renamed_keys_keep_position() {
        let doc = parse(
            r#"{"type": "Feature",
                "properties": {"a": 1, "plot_id": "P1", "b": 2, "country_code": "KE", "c": 3},
                "geometry": null}"#,
        );
        let GeoJson::Feature(feature) = correct_document(doc) else {
            panic!("expected a feature");
        };
        assert_eq!(
            keys(&feature),
            ["a", "ProductionPlace", "b", "ProducerCountry", "c"]
        );
    }

    #[test]
    fn features_without_keys_are_unchanged() {
        let text = r#"{"type": "Feature", "properties": {"name": "x"},
                       "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}"#;
        let (corrected, summary) = correct_document_with_summary(parse(text));
        assert_eq!(corrected, parse(text));
        assert_eq!(summary.ids_removed, 0);
        assert_eq!(summary.keys_renamed, 0);
    }

    #[test]
    fn null_properties_stay_null() {
        let text = r#"{"type": "Feature", "properties": null, "geometry": null}"#;
        let GeoJson::Feature(feature) = correct_document(parse(text)) else {
            panic!("expected a feature");
        };
        assert!(feature.properties.is_none());
    }

    #[test]
    fn renamed_value_replaces_existing_target() {
        // Target before source.
        let doc = parse(
            r#"{"type": "Feature",
                "properties": {"ProductionPlace": "old", "x": 0, "plot_id": "new"},
                "geometry": null}"#,
        );
        let GeoJson::Feature(feature) = correct_document(doc) else {
            panic!("expected a feature");
        };
        assert_eq!(keys(&feature), ["ProductionPlace", "x"]);
        assert_eq!(feature.properties.unwrap()["ProductionPlace"], "new");

        // Source before target.
        let doc = parse(
            r#"{"type": "Feature",
                "properties": {"plot_id": "new", "x": 0, "ProductionPlace": "old"},
                "geometry": null}"#,
        );
        let GeoJson::Feature(feature) = correct_document(doc) else {
            panic!("expected a feature");
        };
        assert_eq!(keys(&feature), ["ProductionPlace", "x"]);
        assert_eq!(feature.properties.unwrap()["ProductionPlace"], "new");
    }

    #[test]
    fn collection_order_and_count_preserved() {
        let doc = parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": 1, "properties": {"plot_id": "A"}, "geometry": null},
                {"type": "Feature", "properties": {"other": true}, "geometry": null},
                {"type": "Feature", "id": 3, "properties": {"country_code": "BR"}, "geometry": null}
            ]}"#,
        );
        let (corrected, summary) = correct_document_with_summary(doc);
        let GeoJson::FeatureCollection(collection) = corrected else {
            panic!("expected a collection");
        };
        assert_eq!(collection.features.len(), 3);
        assert_eq!(keys(&collection.features[0]), ["ProductionPlace"]);
        assert_eq!(keys(&collection.features[1]), ["other"]);
        assert_eq!(keys(&collection.features[2]), ["ProducerCountry"]);
        assert!(collection.features.iter().all(|f| f.id.is_none()));
        assert_eq!(
            summary,
            CorrectionSummary {
                features: 3,
                ids_removed: 2,
                keys_renamed: 2,
            }
        );
    }

    #[test]
    fn correct_bytes_validates_input() {
        assert!(matches!(correct_bytes(b""), Err(GeoslimError::EmptyInput)));
        assert!(matches!(correct_bytes(b"{"), Err(GeoslimError::Parse(_))));
        assert!(matches!(
            correct_bytes(br#"{"type": "LineString", "coordinates": []}"#),
            Err(GeoslimError::UnsupportedType(_))
        ));
        assert!(matches!(
            correct_bytes(
                br#"{"type": "FeatureCollection", "features": [
                    {"type": "Feature", "properties": {}, "geometry": null},
                    {"type": "Feature", "properties": {},
                     "geometry": {"type": "Point", "coordinates": [1]}}]}"#
            ),
            Err(GeoslimError::InvalidGeometry { feature: 1, .. })
        ));
    }

    #[test]
    fn geometry_untouched() {
        let doc = br#"{"type": "Feature", "id": "x", "properties": {"plot_id": 1},
            "geometry": {"type": "Polygon",
                "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}"#;
        let (corrected, _) = correct_bytes(doc).unwrap();
        let GeoJson::Feature(feature) = corrected else {
            panic!("expected a feature");
        };
        match feature.geometry.unwrap().value {
            geojson::Value::Polygon(rings) => assert_eq!(rings[0].len(), 4),
            other => panic!("expected polygon, got {other:?}"),
        }
    }
}
