//! geoslim-export: GeoJSON serializers (sans-IO)
//!
//! Turns simplified and corrected documents back into GeoJSON text and
//! describes the files a host should offer for download. Writing to disk
//! or handing a Blob to the browser is left to the caller.

pub mod download;
pub mod serialize;

pub use download::{CORRECTED_FILENAME, Download, GEOJSON_MIME, SIMPLIFIED_FILENAME};
pub use serialize::{document_to_string, to_geojson, to_geojson_pretty};

/// Errors that can occur while serializing output.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("failed to serialize GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}
