//! Run diagnostics: timing and counts for each processing stage.
//!
//! [`process_with_diagnostics`] drives the same stages as
//! [`crate::process`] and records how long each took and what it
//! produced. Useful for choosing a tolerance on a real dataset and for
//! spotting slow inputs.
//!
//! Timestamps come from a caller-supplied [`Clock`], so this crate stays
//! free of platform time sources. The CLI passes one backed by
//! `std::time::Instant`.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::ReductionBand;
use crate::pipeline::{Pipeline, ProcessResult};
use crate::types::{GeoslimError, SimplifyConfig};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDiagnostics {
    /// Stage 1: document parsing.
    pub parse: StageDiagnostics,
    /// Stage 2: ring simplification.
    pub simplify: StageDiagnostics,
    /// Stage 3: coordinate counting.
    pub measure: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: ProcessSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Document parsing metrics.
    Parse {
        /// Size of the input document in bytes.
        input_bytes: usize,
        /// Number of features in the document.
        feature_count: usize,
        /// Features whose geometry is a Polygon or `MultiPolygon`.
        polygonal_feature_count: usize,
    },
    /// Simplification metrics.
    Simplify {
        /// Tolerance in coordinate units.
        tolerance: f64,
        /// Number of features processed.
        feature_count: usize,
        /// Polygonal coordinates before simplification.
        points_before: usize,
        /// Polygonal coordinates after simplification.
        points_after: usize,
    },
    /// Reduction statistics.
    Measure {
        /// Coordinates in the original document.
        original_points: usize,
        /// Coordinates in the simplified document.
        simplified_points: usize,
        /// Percentage of coordinates removed.
        reduction_pct: f64,
        /// Advisory band for `reduction_pct`.
        band: ReductionBand,
    },
}

/// High-level summary for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Tolerance used.
    pub tolerance: f64,
    /// Number of features.
    pub feature_count: usize,
    /// Coordinates before simplification.
    pub original_points: usize,
    /// Coordinates after simplification.
    pub simplified_points: usize,
    /// Percentage of coordinates removed.
    pub reduction_pct: f64,
}

/// Run every stage, timing each with `clock`.
///
/// # Errors
///
/// Returns the same errors as [`crate::process`].
pub fn process_with_diagnostics<C: Clock>(
    bytes: &[u8],
    config: &SimplifyConfig,
    clock: &C,
) -> Result<(ProcessResult, ProcessDiagnostics), GeoslimError> {
    let total_start = clock.now();

    let start = clock.now();
    let parsed = Pipeline::new(bytes.to_vec(), *config).parse()?;
    let parse = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Parse {
            input_bytes: parsed.source_len(),
            feature_count: parsed.original().len(),
            polygonal_feature_count: parsed
                .original()
                .features
                .iter()
                .filter(|f| f.geometry.as_ref().is_some_and(crate::Geometry::is_polygonal))
                .count(),
        },
    };

    let start = clock.now();
    let simplified = parsed.simplify()?;
    let simplify_duration = clock.elapsed(&start);
    let feature_count = simplified.simplified().len();

    let start = clock.now();
    let measured = simplified.measure();
    let measure_duration = clock.elapsed(&start);
    let stats = *measured.stats();

    let simplify = StageDiagnostics {
        duration: simplify_duration,
        metrics: StageMetrics::Simplify {
            tolerance: config.tolerance,
            feature_count,
            points_before: stats.original_points,
            points_after: stats.simplified_points,
        },
    };
    let measure = StageDiagnostics {
        duration: measure_duration,
        metrics: StageMetrics::Measure {
            original_points: stats.original_points,
            simplified_points: stats.simplified_points,
            reduction_pct: stats.reduction_pct,
            band: stats.band(),
        },
    };

    let diagnostics = ProcessDiagnostics {
        parse,
        simplify,
        measure,
        total_duration: clock.elapsed(&total_start),
        summary: ProcessSummary {
            tolerance: config.tolerance,
            feature_count,
            original_points: stats.original_points,
            simplified_points: stats.simplified_points,
            reduction_pct: stats.reduction_pct,
        },
    };
    Ok((measured.into_result(), diagnostics))
}

impl ProcessDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Simplification Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Features: {}  |  Tolerance: {}",
            self.summary.feature_count, self.summary.tolerance,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Parse", &self.parse),
            ("Simplify", &self.simplify),
            ("Measure", &self.measure),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Points: {} -> {}  |  Reduction: {:.1}%",
            self.summary.original_points,
            self.summary.simplified_points,
            self.summary.reduction_pct,
        ));
        if let Some(advice) = ReductionBand::classify(self.summary.reduction_pct).advice() {
            lines.push(advice.to_string());
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Parse {
            input_bytes,
            feature_count,
            polygonal_feature_count,
        } => format!("{input_bytes} bytes -> {feature_count} features ({polygonal_feature_count} polygonal)"),
        StageMetrics::Simplify {
            tolerance,
            feature_count,
            points_before,
            points_after,
        } => format!("tol={tolerance} {feature_count} features, {points_before}->{points_after} pts"),
        StageMetrics::Measure {
            reduction_pct,
            band,
            ..
        } => format!("{reduction_pct:.1}% reduction ({band:?})"),
    }
}
