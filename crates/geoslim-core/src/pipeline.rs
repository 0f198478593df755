//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs every stage in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use geoslim_core::{Pipeline, SimplifyConfig, GeoslimError};
//! # fn run(bytes: Vec<u8>) -> Result<(), GeoslimError> {
//! let config = SimplifyConfig::default();
//! let result = Pipeline::new(bytes, config)
//!     .parse()?
//!     .simplify()?
//!     .measure()
//!     .into_result();
//!
//! println!("{:.1}% fewer points", result.stats.reduction_pct);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying all previously computed
//! intermediates. The original collection is never modified: from
//! [`Simplified`] onward the original and simplified collections are held
//! side by side as independent values.

use crate::metrics::{ReductionStats, view_center};
use crate::types::{FeatureCollection, GeoslimError, Point, SimplifyConfig};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The source bytes and config are stored but not yet touched.
/// Call [`parse`](Self::parse) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .parse() to continue"]
pub struct Pending {
    config: SimplifyConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// The configuration this run will use.
    #[must_use]
    pub const fn config(&self) -> &SimplifyConfig {
        &self.config
    }

    /// Parse the source document and advance to the [`Parsed`] stage.
    ///
    /// # Errors
    ///
    /// Returns any error from [`crate::document::parse_document`].
    pub fn parse(self) -> Result<Parsed, GeoslimError> {
        let original = crate::document::parse_document(&self.source)?;
        Ok(Parsed {
            config: self.config,
            original,
            source_len: self.source.len(),
        })
    }
}

// ───────────────────────── Stage 1: Parsed ───────────────────────────

/// Pipeline state after parsing the source document.
///
/// Call [`simplify`](Self::simplify) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .simplify() to continue"]
pub struct Parsed {
    config: SimplifyConfig,
    original: FeatureCollection,
    source_len: usize,
}

impl Parsed {
    /// The parsed document.
    #[must_use]
    pub const fn original(&self) -> &FeatureCollection {
        &self.original
    }

    /// Size of the source document in bytes.
    #[must_use]
    pub const fn source_len(&self) -> usize {
        self.source_len
    }

    /// Simplify every polygonal geometry and advance to the
    /// [`Simplified`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`GeoslimError::InvalidConfig`] if the configured tolerance
    /// is not finite.
    pub fn simplify(self) -> Result<Simplified, GeoslimError> {
        let features =
            crate::simplify::simplify_features(&self.original.features, self.config.tolerance)?;
        let simplified = FeatureCollection {
            features,
            foreign_members: self.original.foreign_members.clone(),
        };
        log::debug!(
            "simplified {} features at tolerance {}",
            simplified.len(),
            self.config.tolerance
        );
        Ok(Simplified {
            config: self.config,
            original: self.original,
            simplified,
        })
    }
}

// ───────────────────────── Stage 2: Simplified ───────────────────────

/// Pipeline state after simplification.
///
/// Call [`measure`](Self::measure) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .measure() to continue"]
pub struct Simplified {
    config: SimplifyConfig,
    original: FeatureCollection,
    simplified: FeatureCollection,
}

impl Simplified {
    /// The parsed, unmodified document.
    #[must_use]
    pub const fn original(&self) -> &FeatureCollection {
        &self.original
    }

    /// The simplified document.
    #[must_use]
    pub const fn simplified(&self) -> &FeatureCollection {
        &self.simplified
    }

    /// The configuration used for simplification.
    #[must_use]
    pub const fn config(&self) -> &SimplifyConfig {
        &self.config
    }

    /// Count coordinates before and after and advance to the
    /// [`Measured`] stage.
    pub fn measure(self) -> Measured {
        let stats = ReductionStats::compute(&self.original.features, &self.simplified.features);
        let center = view_center(&self.original.features);
        log::debug!(
            "{} -> {} points ({:.1}% reduction)",
            stats.original_points,
            stats.simplified_points,
            stats.reduction_pct
        );
        Measured {
            original: self.original,
            simplified: self.simplified,
            stats,
            center,
        }
    }
}

// ───────────────────────── Stage 3: Measured ─────────────────────────

/// Final pipeline state: both documents plus their statistics.
#[must_use = "call .into_result() to take the documents and statistics"]
pub struct Measured {
    original: FeatureCollection,
    simplified: FeatureCollection,
    stats: ReductionStats,
    center: Option<Point>,
}

impl Measured {
    /// Before/after coordinate totals.
    #[must_use]
    pub const fn stats(&self) -> &ReductionStats {
        &self.stats
    }

    /// Consume the pipeline and return its outputs.
    pub fn into_result(self) -> ProcessResult {
        ProcessResult {
            original: self.original,
            simplified: self.simplified,
            stats: self.stats,
            center: self.center,
        }
    }
}

/// Output of a complete simplification run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    /// The parsed input, as a collection (a single Feature input becomes
    /// a one-element collection).
    pub original: FeatureCollection,
    /// The simplified collection, feature-for-feature parallel to
    /// `original`.
    pub simplified: FeatureCollection,
    /// Before/after coordinate totals.
    pub stats: ReductionStats,
    /// Centroid of the first feature, for centring map views.
    pub center: Option<Point>,
}

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over `source` bytes.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(source: Vec<u8>, config: SimplifyConfig) -> Pending {
        Pending { config, source }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::metrics::ReductionBand;

    const DOC: &str = r#"{
        "type": "FeatureCollection",
        "name": "plots",
        "features": [
            {"type": "Feature", "properties": {"plot_id": "P1"},
             "geometry": {"type": "Polygon", "coordinates": [[
                [0, 0], [0.5, 0], [1, 0], [1, 0.5], [1, 1],
                [0.5, 1], [0, 1], [0, 0.5], [0, 0]
             ]]}},
            {"type": "Feature", "properties": {"plot_id": "P2"},
             "geometry": {"type": "Point", "coordinates": [3, 4]}}
        ]
    }"#;

    #[test]
    fn stages_carry_intermediates() {
        let parsed = Pipeline::new(DOC.as_bytes().to_vec(), SimplifyConfig::new(0.01))
            .parse()
            .unwrap();
        assert_eq!(parsed.original().len(), 2);
        assert_eq!(parsed.source_len(), DOC.len());

        let simplified = parsed.simplify().unwrap();
        assert_eq!(simplified.simplified().len(), 2);
        assert_eq!(simplified.original().len(), 2);

        let measured = simplified.measure();
        assert_eq!(measured.stats().original_points, 9);
        assert_eq!(measured.stats().simplified_points, 5);

        let result = measured.into_result();
        assert!((result.stats.reduction_pct - 400.0 / 9.0).abs() < 1e-9);
        assert_eq!(result.stats.band(), ReductionBand::Neutral);
        let center = result.center.unwrap();
        assert!((center.x - 0.5).abs() < 1e-12);
        assert!((center.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn foreign_members_survive() {
        let result = Pipeline::new(DOC.as_bytes().to_vec(), SimplifyConfig::default())
            .parse()
            .unwrap()
            .simplify()
            .unwrap()
            .measure()
            .into_result();
        let name = |c: &FeatureCollection| c.foreign_members.as_ref().unwrap()["name"].clone();
        assert_eq!(name(&result.original), "plots");
        assert_eq!(name(&result.simplified), "plots");
    }

    #[test]
    fn lossless_tolerance_changes_nothing() {
        let result = Pipeline::new(DOC.as_bytes().to_vec(), SimplifyConfig::new(0.0))
            .parse()
            .unwrap()
            .simplify()
            .unwrap()
            .measure()
            .into_result();
        assert_eq!(result.original, result.simplified);
        assert!((result.stats.reduction_pct - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nan_tolerance_fails_at_simplify() {
        let parsed = Pipeline::new(DOC.as_bytes().to_vec(), SimplifyConfig::new(f64::NAN))
            .parse()
            .unwrap();
        assert!(matches!(
            parsed.simplify(),
            Err(GeoslimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn parse_errors_surface_from_pending() {
        let result = Pipeline::new(b"not json".to_vec(), SimplifyConfig::default()).parse();
        assert!(matches!(result, Err(GeoslimError::Parse(_))));
    }
}
