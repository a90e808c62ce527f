//! Polyline storage module
//!
//! This module provides the `Polyline` struct for storing one parsed line
//! geometry with precomputed metadata like its bounding box and arc length.

use crate::{Error, Result, utils};
use geo::{BoundingRect, Coord, LineString, Rect};

/// A single open route line extracted from a KML document
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polyline {
    /// Vertices in document order, `x` = longitude and `y` = latitude
    line: LineString<f64>,
    /// Document-order index of the `LineString` element this came from
    source_index: usize,
    /// Name of the enclosing placemark, if it had one
    name: Option<String>,
    /// Precomputed bounding box in raw coordinate units
    bounding_box: Rect<f64>,
    /// Cached planar arc length (computed once during construction)
    cached_length: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Polyline {
    /// Create a new Polyline from its vertices
    ///
    /// # Arguments
    /// * `coords` - Vertices in order, at least two
    /// * `source_index` - Index of the source line element in the document
    /// * `name` - Optional placemark name carried along for display
    ///
    /// # Returns
    /// The polyline on success, or an error if fewer than two vertices were given
    pub fn new(coords: Vec<Coord<f64>>, source_index: usize, name: Option<String>) -> Result<Self> {
        if coords.len() < 2 {
            return Err(Error::InvalidGeometry(format!(
                "a polyline needs at least 2 points, got {}",
                coords.len()
            )));
        }

        let line = LineString::new(coords);
        let bounding_box = line
            .bounding_rect()
            .ok_or_else(|| Error::InvalidGeometry("empty polyline".to_string()))?;
        let cached_length = line.lines().map(|l| utils::planar_length(&l)).sum();

        Ok(Self {
            line,
            source_index,
            name,
            bounding_box,
            cached_length,
        })
    }

    /// Access the underlying line string
    #[inline]
    pub fn line_string(&self) -> &LineString<f64> {
        &self.line
    }

    /// Vertices of this polyline
    #[inline]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.line.0.len()
    }

    /// Always false: construction rejects lines with fewer than two vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.line.0.is_empty()
    }

    /// First vertex
    #[inline]
    pub fn start(&self) -> Coord<f64> {
        self.line.0[0]
    }

    /// Last vertex
    #[inline]
    pub fn end(&self) -> Coord<f64> {
        self.line.0[self.line.0.len() - 1]
    }

    /// Index of the source `LineString` element in document order
    #[inline]
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Name of the enclosing placemark
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the bounding box in raw coordinate units
    #[inline]
    pub fn bounding_box(&self) -> Rect<f64> {
        self.bounding_box
    }

    /// Total planar arc length
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn length(&self) -> f64 {
        self.cached_length
    }

    /// Vertices as `(lat, lon)` pairs, the order map widgets expect
    pub fn lat_lon_pairs(&self) -> Vec<(f64, f64)> {
        self.line.0.iter().map(|c| (c.y, c.x)).collect()
    }
}
