//! Placement of evenly spaced markers along a polyline

use crate::{Error, Polyline, Result, utils};
use geo::Coord;

/// A generated point on a polyline together with its arc-length position
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// Interpolated location, `x` = longitude and `y` = latitude
    pub position: Coord<f64>,
    /// Planar distance from the first vertex of the polyline
    pub distance: f64,
}

/// Upper bound on markers generated for a single line
pub const MAX_MARKERS_PER_LINE: usize = 1_000_000;

/// How target distances are generated before the endpoint is appended
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepPolicy {
    /// Floor-to-unit stepping with forced endpoint.
    ///
    /// Both the interval and the total length are truncated to whole units when
    /// generating steps: targets are `0, s, 2s, ...` below `floor(length)` with
    /// `s = max(floor(interval), 1)`. The exact length is appended last.
    #[default]
    FloorToUnit,
    /// Fractional stepping with forced endpoint: `0, i, 2i, ...` below the exact
    /// length, then the length itself.
    Exact,
}

impl StepPolicy {
    /// Check that `interval` can drive this policy
    pub fn validate_interval(self, interval: f64) -> Result<()> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "interval must be a positive number, got {interval}"
            )));
        }
        Ok(())
    }

    /// Distance between consecutive targets and the limit they stay below
    #[inline]
    fn stepping(self, length: f64, interval: f64) -> (f64, f64) {
        match self {
            // sub-unit intervals step one unit at a time
            StepPolicy::FloorToUnit => (length.floor(), interval.floor().max(1.0)),
            StepPolicy::Exact => (length, interval),
        }
    }

    /// Target distances for a line of `length`, always ending with `length`
    ///
    /// Expects an interval already accepted by [`StepPolicy::validate_interval`].
    ///
    /// # Errors
    /// `Error::InvalidParameter` if the line would need more than
    /// [`MAX_MARKERS_PER_LINE`] markers.
    pub fn target_distances(self, length: f64, interval: f64) -> Result<Vec<f64>> {
        let (limit, step) = self.stepping(length, interval);

        let steps = (limit / step).ceil();
        if steps + 1.0 > MAX_MARKERS_PER_LINE as f64 {
            return Err(Error::InvalidParameter(format!(
                "interval {interval} on a line of length {length} needs more than \
                 {MAX_MARKERS_PER_LINE} markers"
            )));
        }

        let mut distances = Vec::with_capacity(steps as usize + 1);
        let mut k: u64 = 0;
        loop {
            let d = k as f64 * step;
            if d >= limit {
                break;
            }
            distances.push(d);
            k += 1;
        }
        distances.push(length);
        Ok(distances)
    }
}

/// Segment `polyline` at `interval` using the default [`StepPolicy`]
///
/// See [`segment_with_policy`].
pub fn segment(polyline: &Polyline, interval: f64) -> Result<Vec<Marker>> {
    segment_with_policy(polyline, interval, StepPolicy::default())
}

/// Place markers along `polyline` every `interval` units of planar arc length
///
/// The last marker always sits exactly on the final vertex. A polyline whose
/// total length is zero yields no markers.
///
/// # Errors
/// `Error::InvalidParameter` if `interval` is not a positive finite number, in
/// which case nothing is computed, or if the line would need more than
/// [`MAX_MARKERS_PER_LINE`] markers.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn segment_with_policy(
    polyline: &Polyline,
    interval: f64,
    policy: StepPolicy,
) -> Result<Vec<Marker>> {
    policy.validate_interval(interval)?;

    let total = polyline.length();
    if total == 0.0 {
        tracing::debug!(
            "Polyline {} has zero length, no markers placed",
            polyline.source_index()
        );
        return Ok(Vec::new());
    }

    let mut walker = ArcWalker::new(polyline);
    Ok(policy
        .target_distances(total, interval)?
        .into_iter()
        .map(|distance| Marker {
            position: walker.point_at(distance),
            distance,
        })
        .collect())
}

/// Forward-only cursor over the segments of a polyline
///
/// Targets must be requested in non-decreasing order, which keeps a full
/// segmentation linear in the number of vertices plus markers.
struct ArcWalker<'a> {
    polyline: &'a Polyline,
    /// Index of the segment starting at vertex `segment`
    segment: usize,
    /// Arc length at the start of the current segment
    walked: f64,
}

impl<'a> ArcWalker<'a> {
    fn new(polyline: &'a Polyline) -> Self {
        Self {
            polyline,
            segment: 0,
            walked: 0.0,
        }
    }

    fn point_at(&mut self, distance: f64) -> Coord<f64> {
        let coords = self.polyline.coords();
        if distance <= 0.0 {
            return self.polyline.start();
        }
        if distance >= self.polyline.length() {
            return self.polyline.end();
        }

        while self.segment + 1 < coords.len() {
            let a = coords[self.segment];
            let b = coords[self.segment + 1];
            let len = utils::planar_distance(a, b);
            if self.walked + len >= distance {
                // walked < distance here, so len > 0
                return utils::lerp(a, b, (distance - self.walked) / len);
            }
            self.walked += len;
            self.segment += 1;
        }

        self.polyline.end()
    }
}
