//! Download descriptors: the file name, MIME type, and contents a host
//! should offer for each output.

use geojson::GeoJson;
use geoslim_core::ProcessResult;
use serde::{Deserialize, Serialize};

use crate::ExportError;

/// File name offered for the simplified document.
pub const SIMPLIFIED_FILENAME: &str = "simplified.geojson";

/// File name offered for the corrected document.
pub const CORRECTED_FILENAME: &str = "corrected_geojson.geojson";

/// MIME type for every GeoJSON download.
pub const GEOJSON_MIME: &str = "application/json";

/// A file ready to be written to disk or handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Suggested file name.
    pub filename: String,
    /// MIME type of `contents`.
    pub mime_type: String,
    /// File contents.
    pub contents: String,
}

impl Download {
    /// The simplified collection from a completed run.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if serialization fails.
    pub fn simplified(result: &ProcessResult) -> Result<Self, ExportError> {
        Ok(Self::geojson(
            SIMPLIFIED_FILENAME,
            crate::to_geojson_pretty(&result.simplified)?,
        ))
    }

    /// The simplified collection as single-line GeoJSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if serialization fails.
    pub fn simplified_compact(result: &ProcessResult) -> Result<Self, ExportError> {
        Ok(Self::geojson(
            SIMPLIFIED_FILENAME,
            crate::to_geojson(&result.simplified)?,
        ))
    }

    /// A corrected document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if serialization fails.
    pub fn corrected(document: &GeoJson) -> Result<Self, ExportError> {
        Ok(Self::geojson(
            CORRECTED_FILENAME,
            crate::document_to_string(document)?,
        ))
    }

    fn geojson(filename: &str, contents: String) -> Self {
        Self {
            filename: filename.to_string(),
            mime_type: GEOJSON_MIME.to_string(),
            contents,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use geoslim_core::SimplifyConfig;

    use super::*;

    #[test]
    fn simplified_download() {
        let doc = br#"{"type": "FeatureCollection", "features": []}"#;
        let result = geoslim_core::process(doc, &SimplifyConfig::default()).unwrap();
        let download = Download::simplified(&result).unwrap();
        assert_eq!(download.filename, "simplified.geojson");
        assert_eq!(download.mime_type, "application/json");
        assert!(download.contents.contains("FeatureCollection"));
    }

    #[test]
    fn compact_download_is_one_line() {
        let doc = br#"{"type": "Feature", "properties": {"k": 1},
            "geometry": {"type": "Polygon",
                "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}"#;
        let result = geoslim_core::process(doc, &SimplifyConfig::default()).unwrap();
        let compact = Download::simplified_compact(&result).unwrap();
        let pretty = Download::simplified(&result).unwrap();
        assert_eq!(compact.filename, pretty.filename);
        assert!(!compact.contents.contains('\n'));
        assert!(compact.contents.len() < pretty.contents.len());
        let a: serde_json::Value = serde_json::from_str(&compact.contents).unwrap();
        let b: serde_json::Value = serde_json::from_str(&pretty.contents).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn corrected_download() {
        let (doc, _) = geoslim_core::correct_bytes(
            br#"{"type": "Feature", "id": 1, "properties": {"plot_id": "x"}, "geometry": null}"#,
        )
        .unwrap();
        let download = Download::corrected(&doc).unwrap();
        assert_eq!(download.filename, "corrected_geojson.geojson");
        assert_eq!(download.mime_type, "application/json");
        assert!(download.contents.contains("ProductionPlace"));
        assert!(!download.contents.contains("\"id\""));
    }
}
