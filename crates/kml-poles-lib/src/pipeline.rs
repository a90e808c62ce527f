//! Pipeline - parse, segment, label and encode one uploaded document
//!
//! This module provides the high-level API the UI shell calls: raw document
//! bytes and explicit configuration in, polylines, markers, the regenerated
//! document and diagnostics out.

use crate::diagnostics::{self, Diagnostic, DiagnosticKind};
use crate::{
    EncodeOptions, Error, LabelConfig, Marker, ParseOptions, Placemark, Polyline, Result,
    StepPolicy, encoder, kmz, labels, parser, segment,
};

use geo::{Coord, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Default spacing between markers, in coordinate units
pub const DEFAULT_INTERVAL: f64 = 30.0;

/// Configuration for one pipeline invocation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Spacing between markers along each line (default 30)
    pub interval: f64,
    /// Label prefix and numbering (default `TE`, numbered per line)
    pub label: LabelConfig,
    /// How step distances are generated (default floor-to-unit)
    pub step_policy: StepPolicy,
    pub parse: ParseOptions,
    pub encode: EncodeOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            label: LabelConfig::default(),
            step_policy: StepPolicy::default(),
            parse: ParseOptions::default(),
            encode: EncodeOptions::default(),
        }
    }
}

/// A parsed polyline and the markers placed along it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentedLine {
    pub polyline: Polyline,
    pub markers: Vec<Marker>,
}

impl AsRef<[Marker]> for SegmentedLine {
    fn as_ref(&self) -> &[Marker] {
        &self.markers
    }
}

/// Counts describing a pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineSummary {
    /// Number of valid lines
    pub line_count: usize,
    /// Number of generated placemarks
    pub total_points: usize,
    /// Sum of planar line lengths
    pub total_length: f64,
    /// Number of diagnostics collected while reading
    pub diagnostic_count: usize,
}

/// Everything one invocation produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    lines: Vec<SegmentedLine>,
    placemarks: Vec<Placemark>,
    document: Vec<u8>,
    diagnostics: Vec<Diagnostic>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PipelineOutput {
    /// Lines with their markers, in document order
    #[inline]
    pub fn lines(&self) -> &[SegmentedLine] {
        &self.lines
    }

    /// Parsed polylines, in document order
    pub fn polylines(&self) -> impl Iterator<Item = &Polyline> {
        self.lines.iter().map(|l| &l.polyline)
    }

    /// All markers across all lines, in output order
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.lines.iter().flat_map(|l| l.markers.iter())
    }

    /// Named placemarks, in output order
    #[inline]
    pub fn placemarks(&self) -> &[Placemark] {
        &self.placemarks
    }

    /// The regenerated KML document
    #[inline]
    pub fn document(&self) -> &[u8] {
        &self.document
    }

    /// Consume the output, keeping only the regenerated document
    #[inline]
    pub fn into_document(self) -> Vec<u8> {
        self.document
    }

    /// Non-fatal findings from reading the input
    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of valid lines
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of generated placemarks
    #[inline]
    pub fn total_points(&self) -> usize {
        self.placemarks.len()
    }

    /// Get pipeline summary
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            line_count: self.lines.len(),
            total_points: self.placemarks.len(),
            total_length: self.lines.iter().map(|l| l.polyline.length()).sum(),
            diagnostic_count: self.diagnostics.len(),
        }
    }

    /// Combined bounding box of all lines in raw coordinate units
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.lines
            .iter()
            .map(|l| l.polyline.bounding_box())
            .reduce(|acc, bbox| {
                Rect::new(
                    Coord {
                        x: acc.min().x.min(bbox.min().x),
                        y: acc.min().y.min(bbox.min().y),
                    },
                    Coord {
                        x: acc.max().x.max(bbox.max().x),
                        y: acc.max().y.max(bbox.max().y),
                    },
                )
            })
    }

    /// Center of all lines as `(lat, lon)`, for centering a map preview
    ///
    /// Returns `None` if there are no lines.
    #[inline]
    pub fn center_lat_lon(&self) -> Option<(f64, f64)> {
        self.bounding_box().map(|bbox| {
            let center = bbox.center();
            (center.y, center.x)
        })
    }
}

/// Run the whole pipeline on one document
///
/// `bytes` may be plain KML or a KMZ archive.
///
/// # Errors
/// - `Error::InvalidParameter` if the interval is unusable, before any parsing,
///   or if a line would need more than [`crate::MAX_MARKERS_PER_LINE`] markers
/// - `Error::NoValidLines` if the document yields no polyline at all; it carries
///   the diagnostics explaining why
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn process(bytes: &[u8], config: &PipelineConfig) -> Result<PipelineOutput> {
    config.step_policy.validate_interval(config.interval)?;

    let mut archive_diagnostics = Vec::new();
    let kml: Cow<'_, [u8]> = if kmz::is_kmz(bytes) {
        match kmz::read_kmz(bytes) {
            Ok(document) => Cow::Owned(document),
            Err(err) => {
                diagnostics::record(
                    &mut archive_diagnostics,
                    Diagnostic::new(
                        DiagnosticKind::DocumentParse,
                        format!("unreadable KMZ archive: {err}"),
                        None,
                    ),
                );
                return Err(Error::NoValidLines {
                    diagnostics: archive_diagnostics,
                });
            }
        }
    } else {
        Cow::Borrowed(bytes)
    };

    let parsed = parser::parse_with_options(&kml, &config.parse);
    if parsed.polylines.is_empty() {
        return Err(Error::NoValidLines {
            diagnostics: parsed.diagnostics,
        });
    }

    let mut lines = Vec::with_capacity(parsed.polylines.len());
    for polyline in parsed.polylines {
        let markers = segment::segment_with_policy(&polyline, config.interval, config.step_policy)?;
        tracing::debug!(
            "Line {} (length {:.3}) -> {} markers",
            polyline.source_index(),
            polyline.length(),
            markers.len()
        );
        lines.push(SegmentedLine { polyline, markers });
    }

    let placemarks = labels::label_markers(&lines, &config.label);
    let document = encoder::encode(&placemarks, &config.encode)?;

    tracing::info!(
        "Placed {} markers on {} lines",
        placemarks.len(),
        lines.len()
    );

    Ok(PipelineOutput {
        lines,
        placemarks,
        document,
        diagnostics: parsed.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Numbering, parse_placemark_points};

    fn kml(lines: &[&str]) -> Vec<u8> {
        let placemarks: String = lines
            .iter()
            .map(|c| {
                format!(
                    "<Placemark><LineString><coordinates>{c}</coordinates></LineString></Placemark>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><kml xmlns="http://www.opengis.net/kml/2.2"><Document><Folder>{placemarks}</Folder></Document></kml>"#
        )
        .into_bytes()
    }

    fn config(interval: f64, numbering: Numbering) -> PipelineConfig {
        PipelineConfig {
            interval,
            label: LabelConfig::new("TE", numbering),
            ..PipelineConfig::default()
        }
    }

    fn names(output: &PipelineOutput) -> Vec<&str> {
        output.placemarks().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.interval, 30.0);
        assert_eq!(config.label.prefix, "TE");
        assert_eq!(config.step_policy, StepPolicy::FloorToUnit);
    }

    #[test]
    fn test_straight_line_every_five() {
        let output = process(&kml(&["0,0,0 0,10,0 0,20,0"]), &config(5.0, Numbering::PerLine)).unwrap();

        assert_eq!(output.line_count(), 1);
        assert_eq!(output.total_points(), 5);
        assert_eq!(names(&output), vec!["TE1", "TE2", "TE3", "TE4", "TE5"]);
        let distances: Vec<f64> = output.markers().map(|m| m.distance).collect();
        assert_eq!(distances, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_straight_line_every_seven() {
        let output = process(&kml(&["0,0,0 0,10,0 0,20,0"]), &config(7.0, Numbering::PerLine)).unwrap();

        let distances: Vec<f64> = output.markers().map(|m| m.distance).collect();
        assert_eq!(distances, vec![0.0, 7.0, 14.0, 20.0]);
        assert_eq!(
            output.placemarks().last().unwrap().position,
            Coord { x: 0.0, y: 20.0 }
        );
    }

    #[test]
    fn test_numbering_modes_across_lines() {
        let doc = kml(&["0,0 0,10", "5,0 5,5"]);

        let per_line = process(&doc, &config(5.0, Numbering::PerLine)).unwrap();
        assert_eq!(names(&per_line), vec!["TE1", "TE2", "TE3", "TE1", "TE2"]);

        let global = process(&doc, &config(5.0, Numbering::Global)).unwrap();
        assert_eq!(names(&global), vec!["TE1", "TE2", "TE3", "TE4", "TE5"]);

        let constant = process(&doc, &config(5.0, Numbering::Constant)).unwrap();
        assert!(names(&constant).iter().all(|n| *n == "TE"));
    }

    #[test]
    fn test_document_matches_placemarks() {
        let output = process(&kml(&["0,0 0,10", "1,1 4,5"]), &config(3.0, Numbering::Global)).unwrap();

        let reread = parse_placemark_points(output.document(), &ParseOptions::default());
        assert!(reread.diagnostics.is_empty());
        assert_eq!(reread.placemarks.as_slice(), output.placemarks());
    }

    #[test]
    fn test_invalid_interval_fails_first() {
        // the document is broken too, but the interval is checked before parsing
        let result = process(b"<kml", &config(0.0, Numbering::PerLine));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_sub_unit_interval_is_accepted() {
        let output = process(&kml(&["0,0 0,3"]), &config(0.5, Numbering::PerLine)).unwrap();
        assert_eq!(output.total_points(), 4);
    }

    #[test]
    fn test_tiny_document_cannot_demand_unbounded_output() {
        let result = process(&kml(&["0,0 0,10000000"]), &config(1.0, Numbering::PerLine));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_no_valid_lines() {
        let result = process(&kml(&["1,1", "bad"]), &PipelineConfig::default());
        match result {
            Err(Error::NoValidLines { diagnostics }) => {
                let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
                assert_eq!(
                    kinds,
                    vec![
                        DiagnosticKind::InsufficientPoints,
                        DiagnosticKind::MalformedCoordinateToken,
                        DiagnosticKind::InsufficientPoints,
                    ]
                );
            }
            other => panic!("expected NoValidLines, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_document_reports_no_lines() {
        let result = process(b"<kml><Document>", &PipelineConfig::default());
        match result {
            Err(Error::NoValidLines { diagnostics }) => {
                assert_eq!(diagnostics.len(), 1);
                assert!(diagnostics[0].is_fatal());
            }
            other => panic!("expected NoValidLines, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_length_line_is_valid_but_unmarked() {
        let output = process(&kml(&["2,2 2,2", "0,0 0,10"]), &config(5.0, Numbering::PerLine)).unwrap();

        assert_eq!(output.line_count(), 2);
        assert!(output.lines()[0].markers.is_empty());
        assert_eq!(output.lines()[1].markers.len(), 3);
        assert_eq!(names(&output), vec!["TE1", "TE2", "TE3"]);
    }

    #[test]
    fn test_diagnostics_are_returned_with_output() {
        let output = process(&kml(&["0,0 oops 0,10"]), &config(5.0, Numbering::PerLine)).unwrap();
        assert_eq!(output.diagnostics().len(), 1);
        assert_eq!(output.summary().diagnostic_count, 1);
    }

    #[test]
    fn test_kmz_input() {
        let archive = kmz::write_kmz(&kml(&["0,0 0,20"])).unwrap();
        let output = process(&archive, &config(5.0, Numbering::PerLine)).unwrap();
        assert_eq!(output.total_points(), 5);
    }

    #[test]
    fn test_broken_kmz_reports_no_lines() {
        let result = process(b"PK\x03\x04broken", &PipelineConfig::default());
        assert!(matches!(result, Err(Error::NoValidLines { .. })));
    }

    #[test]
    fn test_summary_and_extent() {
        let output = process(&kml(&["0,0 0,10", "10,0 10,4"]), &config(5.0, Numbering::PerLine)).unwrap();

        let summary = output.summary();
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.total_points, 5);
        assert!((summary.total_length - 14.0).abs() < 1e-12);

        let bbox = output.bounding_box().unwrap();
        assert_eq!(bbox.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bbox.max(), Coord { x: 10.0, y: 10.0 });
        assert_eq!(output.center_lat_lon(), Some((5.0, 5.0)));
    }
}
