//! Topology-preserving ring simplification (Ramer-Douglas-Peucker).
//!
//! Reduces point count in polygon rings by removing points that are
//! within `tolerance` of the chord between their retained neighbours.
//! Plain RDP can make a ring cross itself, so a section of the ring is
//! only collapsed onto its chord when:
//!
//! - every removed point lies within `tolerance` of the chord, and
//! - the chord has no interior intersection with any segment of the ring
//!   that is still in play: original segments not yet replaced, and
//!   chords already emitted.
//!
//! Both segment sets live in R\*-trees so each check is a bounding-box
//! query rather than a scan of the whole ring.
//!
//! A ring never drops below [`MIN_RING_LEN`] points (a triangle plus the
//! closing point), and a result whose winding differs from the input's
//! is discarded in favour of the input ring.
//!
//! Holes are simplified independently of their exterior. A hole can
//! therefore end up crossing the simplified exterior; callers that need
//! a valid polygon must check for that themselves.

use geo::line_measures::Distance;
use geo::{Euclidean, Line};
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::algorithm::winding_order::Winding;
use rstar::primitives::GeomWithData;
use rstar::{RTree, RTreeObject};

use crate::types::{Feature, GeoslimError, Geometry, MultiPolygon, Point, Polygon, Ring};

/// Minimum number of points in a ring: three distinct vertices plus the
/// closing duplicate.
pub const MIN_RING_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Type conversions at the module boundary
// ---------------------------------------------------------------------------

/// Convert a `Point` to a `geo::Coord`.
const fn point_to_coord(p: Point) -> geo::Coord<f64> {
    geo::Coord { x: p.x, y: p.y }
}

fn ring_to_line_string(ring: &Ring) -> geo::LineString<f64> {
    ring.points().iter().copied().map(point_to_coord).collect()
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Simplify every Polygon/MultiPolygon in `features`.
///
/// Returns a new vector of owned features, one per input feature and in
/// the same order. Properties, identifiers, and every non-polygonal
/// geometry are copied unchanged.
///
/// # Errors
///
/// Returns [`GeoslimError::InvalidConfig`] if `tolerance` is not finite.
/// Simplification itself cannot fail, so a valid tolerance always yields
/// exactly `features.len()` features.
pub fn simplify_features(features: &[Feature], tolerance: f64) -> Result<Vec<Feature>, GeoslimError> {
    crate::types::SimplifyConfig::new(tolerance).validate()?;

    Ok(features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature
                .geometry
                .as_ref()
                .map(|g| simplify_geometry(g, tolerance));
            if let (Some(before), Some(after)) = (&feature.geometry, &geometry) {
                log::trace!(
                    "feature {index}: {} {} -> {} points",
                    before.kind(),
                    crate::metrics::coordinate_count(before),
                    crate::metrics::coordinate_count(after),
                );
            }
            Feature {
                geometry,
                properties: feature.properties.clone(),
                id: feature.id.clone(),
                bbox: feature.bbox.clone(),
                foreign_members: feature.foreign_members.clone(),
            }
        })
        .collect())
}

/// Simplify one geometry. Non-polygonal geometries are cloned unchanged.
#[must_use = "returns the simplified geometry"]
pub fn simplify_geometry(geometry: &Geometry, tolerance: f64) -> Geometry {
    match geometry {
        Geometry::Polygon(polygon) => Geometry::Polygon(simplify_polygon(polygon, tolerance)),
        Geometry::MultiPolygon(multi) => {
            Geometry::MultiPolygon(simplify_multi_polygon(multi, tolerance))
        }
        Geometry::Passthrough(_) => geometry.clone(),
    }
}

/// Simplify each member polygon independently.
#[must_use = "returns the simplified multi-polygon"]
pub fn simplify_multi_polygon(multi: &MultiPolygon, tolerance: f64) -> MultiPolygon {
    MultiPolygon::new(
        multi
            .polygons()
            .iter()
            .map(|p| simplify_polygon(p, tolerance))
            .collect(),
    )
}

/// Simplify the exterior and each hole of a polygon independently.
#[must_use = "returns the simplified polygon"]
pub fn simplify_polygon(polygon: &Polygon, tolerance: f64) -> Polygon {
    Polygon::new(
        polygon
            .rings()
            .iter()
            .map(|r| simplify_ring(r, tolerance))
            .collect(),
    )
}

/// Simplify a single closed ring.
///
/// Returns the ring unchanged when `tolerance <= 0.0`, when the ring is
/// not closed, or when it already has [`MIN_RING_LEN`] points or fewer.
/// Otherwise the result is a subsequence of the input points that is
/// still closed, has at least [`MIN_RING_LEN`] points, introduces no new
/// self-intersections, and keeps the input winding.
#[must_use = "returns the simplified ring"]
pub fn simplify_ring(ring: &Ring, tolerance: f64) -> Ring {
    // `!(tolerance > 0.0)` also catches NaN.
    if !(tolerance > 0.0) || !ring.is_closed() || ring.len() <= MIN_RING_LEN {
        return ring.clone();
    }

    let points = ring.points();
    let kept = RingSimplifier::new(points, tolerance).run();

    let simplified = Ring::new(
        points
            .iter()
            .zip(&kept)
            .filter(|&(_, k)| *k)
            .map(|(&p, _)| p)
            .collect(),
    );

    let before = ring_to_line_string(ring).winding_order();
    let after = ring_to_line_string(&simplified).winding_order();
    if before != after {
        log::warn!(
            "simplified ring changed winding ({before:?} -> {after:?}); keeping all {} points",
            ring.len()
        );
        return ring.clone();
    }

    simplified
}

// ---------------------------------------------------------------------------
// Ring simplifier
// ---------------------------------------------------------------------------

/// Index of an original ring segment: from point `i` to point `i + 1`.
type InputSegment = GeomWithData<Line<f64>, usize>;

/// A chord emitted by a collapsed section.
type OutputSegment = GeomWithData<Line<f64>, (usize, usize)>;

/// A section of the ring still to be processed.
#[derive(Debug, Clone, Copy)]
struct Section {
    start: usize,
    end: usize,
    /// Split even if every interior point is within tolerance.
    force_split: bool,
}

/// Working state for simplifying one ring.
struct RingSimplifier<'a> {
    points: &'a [Point],
    tolerance: f64,
    kept: Vec<bool>,
    /// Original segments, queried for conflicts while they are `live`.
    input: RTree<InputSegment>,
    /// `live[i]` is `false` once segment `i` has been replaced by a chord.
    live: Vec<bool>,
    /// Chords emitted so far.
    output: RTree<OutputSegment>,
}

impl<'a> RingSimplifier<'a> {
    /// `points` must be a closed ring with more than [`MIN_RING_LEN`] points.
    fn new(points: &'a [Point], tolerance: f64) -> Self {
        let segment_count = points.len() - 1;
        let segments = (0..segment_count)
            .map(|i| GeomWithData::new(segment(points, i, i + 1), i))
            .collect();

        let mut kept = vec![false; points.len()];
        kept[0] = true;
        kept[segment_count] = true;

        Self {
            points,
            tolerance,
            kept,
            input: RTree::bulk_load(segments),
            live: vec![true; segment_count],
            output: RTree::new(),
        }
    }

    /// Run the simplification and return the per-point keep mask.
    fn run(mut self) -> Vec<bool> {
        let last = self.points.len() - 1;

        // The ring starts and ends on the same point, so the chord of the
        // whole ring is degenerate: anchor a second vertex at the point
        // farthest from the start.
        let Some((far, _)) = self.farthest(0, last) else {
            return self.kept;
        };
        self.kept[far] = true;

        // Two anchors give only a sliver; one of the halves must split
        // again to reach three distinct vertices. Pick the half with the
        // larger deviation.
        let left = self.farthest(0, far).map(|(_, d)| d);
        let right = self.farthest(far, last).map(|(_, d)| d);
        let force_left = match (left, right) {
            (Some(l), Some(r)) => l >= r,
            (Some(_), None) => true,
            _ => false,
        };

        // Depth-first, left section first, so every chord is checked
        // against the already-simplified prefix and the untouched suffix.
        let mut stack = vec![
            Section {
                start: far,
                end: last,
                force_split: !force_left,
            },
            Section {
                start: 0,
                end: far,
                force_split: force_left,
            },
        ];

        while let Some(section) = stack.pop() {
            if let Some(split) = self.process(section) {
                stack.push(Section {
                    start: split,
                    end: section.end,
                    force_split: false,
                });
                stack.push(Section {
                    start: section.start,
                    end: split,
                    force_split: false,
                });
            }
        }

        self.kept
    }

    /// Either collapse `section` onto its chord (returning `None`) or keep
    /// its farthest interior point and return that index as the split.
    fn process(&mut self, section: Section) -> Option<usize> {
        let Section {
            start,
            end,
            force_split,
        } = section;

        let (idx, max_dist) = self.farthest(start, end)?;

        let collapsible = !force_split
            && max_dist <= self.tolerance
            && self.points[start] != self.points[end]
            && !self.chord_conflicts(start, end);

        if collapsible {
            for live in &mut self.live[start..end] {
                *live = false;
            }
            self.output.insert(GeomWithData::new(
                segment(self.points, start, end),
                (start, end),
            ));
            None
        } else {
            self.kept[idx] = true;
            Some(idx)
        }
    }

    /// The interior point of `start..end` farthest from the chord segment,
    /// with its distance. `None` when the section has no interior points.
    fn farthest(&self, start: usize, end: usize) -> Option<(usize, f64)> {
        let chord = segment(self.points, start, end);
        ((start + 1)..end)
            .map(|i| (i, distance_to_segment(self.points[i], &chord)))
            .fold(None, |best, (i, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((i, d)),
            })
    }

    /// Whether the chord `start -> end` would cross any segment that will
    /// remain in the ring.
    fn chord_conflicts(&self, start: usize, end: usize) -> bool {
        let chord = segment(self.points, start, end);
        let envelope = chord.envelope();

        let crosses_input = self
            .input
            .locate_in_envelope_intersecting(&envelope)
            .filter(|candidate| {
                let i = candidate.data;
                self.live[i] && !(start..end).contains(&i)
            })
            .any(|candidate| has_interior_intersection(chord, *candidate.geom()));

        crosses_input
            || self
                .output
                .locate_in_envelope_intersecting(&envelope)
                .any(|candidate| has_interior_intersection(chord, *candidate.geom()))
    }
}

/// The segment between two ring points as a `geo::Line`.
fn segment(points: &[Point], from: usize, to: usize) -> Line<f64> {
    Line::new(point_to_coord(points[from]), point_to_coord(points[to]))
}

/// Whether two segments meet anywhere other than at a shared endpoint.
///
/// Adjacent ring segments touch at their common vertex; that is not a
/// conflict. Any crossing, any touch in the interior of either segment,
/// and any collinear overlap is.
fn has_interior_intersection(a: Line<f64>, b: Line<f64>) -> bool {
    let is_endpoint = |c: geo::Coord<f64>, line: Line<f64>| c == line.start || c == line.end;
    match line_intersection(a, b) {
        None => false,
        Some(LineIntersection::SinglePoint {
            intersection,
            is_proper,
        }) => is_proper || !(is_endpoint(intersection, a) && is_endpoint(intersection, b)),
        Some(LineIntersection::Collinear { intersection }) => {
            intersection.start != intersection.end
                || !(is_endpoint(intersection.start, a) && is_endpoint(intersection.start, b))
        }
    }
}

/// Distance from `p` to the closest point of `chord`.
///
/// A point that projects past either end is measured to that endpoint,
/// and a degenerate chord reduces to point-to-point distance.
fn distance_to_segment(p: Point, chord: &Line<f64>) -> f64 {
    Euclidean.distance(&geo::Point::from(point_to_coord(p)), chord)
}
