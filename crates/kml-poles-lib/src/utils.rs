//! Utility functions for planar measurements and KML coordinate text

use geo::{Coord, Line};

/// Namespace of the KML 2.2 schema, used for matching and for generated documents
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Elevation written into every generated coordinate tuple
pub const DEFAULT_ELEVATION: f64 = 0.0;

/// Euclidean length of a segment measured on raw coordinate values
///
/// No geodesic correction is applied: a degree of longitude and a degree of
/// latitude count the same.
#[inline(always)]
pub fn planar_length(line: &Line<f64>) -> f64 {
    line.dx().hypot(line.dy())
}

/// Euclidean distance between two coordinates
#[inline(always)]
pub fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    planar_length(&Line::new(a, b))
}

/// Linear interpolation between `a` and `b` at `fraction` in `[0, 1]`
#[inline(always)]
pub fn lerp(a: Coord<f64>, b: Coord<f64>, fraction: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * fraction,
        y: a.y + (b.y - a.y) * fraction,
    }
}

/// Format a coordinate as a KML tuple `x,y,elevation`
///
/// Uses the shortest representation that parses back to the same `f64`.
pub fn format_coordinate(coord: Coord<f64>) -> String {
    format!("{},{},{}", coord.x, coord.y, DEFAULT_ELEVATION)
}

/// Strip a UTF-8 byte-order mark, if present
#[inline]
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}
