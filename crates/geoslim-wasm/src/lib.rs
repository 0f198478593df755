//! Browser entry points for geoslim.
//!
//! Compiles to a WASM module the web front end loads directly. Documents
//! go in as raw `Uint8Array` bytes (the contents of the uploaded file)
//! and come back as JSON strings, so the page never has to walk GeoJSON
//! through `JsValue` conversions.
//!
//! Every fallible call rejects with a `JsValue` string holding the
//! JSON-serialized error (`{"kind": ..., "message": ...}`), which the
//! page can parse and show to the user.

pub mod download;

use geoslim_core::{GeoslimError, Point, ReductionBand, ReductionStats, SimplifyConfig};
use geoslim_export::Download;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use download::{DownloadError, trigger_download};

/// Everything the page needs after a simplification run.
///
/// Both documents are included so the page can draw them side by side.
#[derive(Serialize)]
pub struct SimplifyEnvelope {
    pub original: geojson::FeatureCollection,
    pub simplified: geojson::FeatureCollection,
    pub stats: ReductionStats,
    pub band: ReductionBand,
    pub advice: Option<&'static str>,
    pub center: Option<Point>,
}

/// The result of a correction run.
#[derive(Serialize)]
pub struct CorrectEnvelope {
    pub corrected: geojson::GeoJson,
    pub summary: geoslim_core::CorrectionSummary,
}

/// Module initialisation: route panics to the browser console.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Simplify a GeoJSON document at `tolerance`.
///
/// Returns a JSON-serialized [`SimplifyEnvelope`].
///
/// # Errors
///
/// Rejects with a JSON-serialized `GeoslimError`.
#[wasm_bindgen(js_name = simplifyGeojson)]
pub fn simplify_geojson(bytes: &[u8], tolerance: f64) -> Result<String, JsValue> {
    simplify_envelope(bytes, tolerance).map_err(|e| error_to_js(&e))
}

/// Correct feature ids and field names in a GeoJSON document.
///
/// Returns a JSON-serialized [`CorrectEnvelope`].
///
/// # Errors
///
/// Rejects with a JSON-serialized `GeoslimError`.
#[wasm_bindgen(js_name = correctGeojson)]
pub fn correct_geojson(bytes: &[u8]) -> Result<String, JsValue> {
    correct_envelope(bytes).map_err(|e| error_to_js(&e))
}

/// Simplify a document and offer the result as `simplified.geojson`.
///
/// # Errors
///
/// Rejects with a JSON-serialized `GeoslimError` if the document cannot
/// be processed, or a message string if the browser refuses the download.
#[wasm_bindgen(js_name = downloadSimplified)]
pub fn download_simplified(bytes: &[u8], tolerance: f64) -> Result<(), JsValue> {
    let result = geoslim_core::process(bytes, &SimplifyConfig::new(tolerance))
        .map_err(|e| error_to_js(&e))?;
    let file = Download::simplified(&result).map_err(|e| JsValue::from_str(&e.to_string()))?;
    offer(&file)
}

/// Correct a document and offer the result as `corrected_geojson.geojson`.
///
/// # Errors
///
/// See [`download_simplified`].
#[wasm_bindgen(js_name = downloadCorrected)]
pub fn download_corrected(bytes: &[u8]) -> Result<(), JsValue> {
    let (document, _) = geoslim_core::correct_bytes(bytes).map_err(|e| error_to_js(&e))?;
    let file = Download::corrected(&document).map_err(|e| JsValue::from_str(&e.to_string()))?;
    offer(&file)
}

fn offer(file: &Download) -> Result<(), JsValue> {
    trigger_download(file).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run a simplification and serialize the envelope.
///
/// # Errors
///
/// Returns any error from [`geoslim_core::process`]. A serialization
/// failure is reported as [`GeoslimError::Parse`].
pub fn simplify_envelope(bytes: &[u8], tolerance: f64) -> Result<String, GeoslimError> {
    let result = geoslim_core::process(bytes, &SimplifyConfig::new(tolerance))?;
    let band = result.stats.band();
    let envelope = SimplifyEnvelope {
        original: result.original.to_geojson(),
        simplified: result.simplified.to_geojson(),
        stats: result.stats,
        band,
        advice: band.advice(),
        center: result.center,
    };
    log::debug!(
        "simplified {} features ({:.1}% reduction)",
        result.simplified.len(),
        result.stats.reduction_pct
    );
    Ok(serde_json::to_string(&envelope)?)
}

/// Run a correction and serialize the envelope.
///
/// # Errors
///
/// Returns any error from [`geoslim_core::correct_bytes`].
pub fn correct_envelope(bytes: &[u8]) -> Result<String, GeoslimError> {
    let (corrected, summary) = geoslim_core::correct_bytes(bytes)?;
    Ok(serde_json::to_string(&CorrectEnvelope { corrected, summary })?)
}

fn error_to_js(error: &GeoslimError) -> JsValue {
    let json = serde_json::to_string(error).unwrap_or_else(|_| "\"unknown error\"".into());
    JsValue::from_str(&json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SQUARE: &[u8] = br#"{"type": "Feature", "id": "abc",
        "properties": {"plot_id": "P1", "country_code": "KE"},
        "geometry": {"type": "Polygon",
            "coordinates": [[[0, 0], [0.5, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]}}"#;

    #[test]
    fn simplify_envelope_fields() {
        let json = simplify_envelope(SQUARE, 0.01).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["original"]["type"], "FeatureCollection");
        assert_eq!(value["simplified"]["features"].as_array().unwrap().len(), 1);
        assert_eq!(value["stats"]["original_points"], 6);
        assert_eq!(value["stats"]["simplified_points"], 5);
        assert_eq!(value["band"], "neutral");
        assert!(value["advice"].is_null());
        assert!((value["center"]["x"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn simplify_envelope_errors() {
        assert!(matches!(
            simplify_envelope(b"", 0.01),
            Err(GeoslimError::EmptyInput)
        ));
        assert!(matches!(
            simplify_envelope(SQUARE, f64::NAN),
            Err(GeoslimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn correct_envelope_fields() {
        let json = correct_envelope(SQUARE).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["corrected"].get("id").is_none());
        assert_eq!(value["corrected"]["properties"]["ProductionPlace"], "P1");
        assert_eq!(value["summary"]["keys_renamed"], 2);
    }

    #[test]
    fn errors_serialize_with_kind() {
        let err = correct_envelope(br#"{"type": "Point", "coordinates": [0, 0]}"#).unwrap_err();
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "unsupported_type");
        assert!(value["message"].as_str().unwrap().contains("Point"));
    }
}
