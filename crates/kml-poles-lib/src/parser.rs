//! KML reading with per-element error tolerance
//!
//! The parser never fails as a whole: a document that cannot be decoded yields
//! no polylines and a [`DiagnosticKind::DocumentParse`] diagnostic, and every
//! problem below document level only skips the offending token or element.

use crate::diagnostics::{self, Diagnostic, DiagnosticKind};
use crate::{Placemark, Polyline, utils};
use geo::Coord;
use roxmltree::{Document, Node, ParsingOptions};

/// Options for locating line elements
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Only match elements in the KML 2.2 namespace.
    /// When false, any element with a matching local name is accepted.
    pub strict_namespace: bool,
}

/// Result of reading line geometries from a document
#[derive(Clone, Debug, Default)]
pub struct ParsedDocument {
    /// Valid polylines in document order
    pub polylines: Vec<Polyline>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of reading point placemarks from a document
#[derive(Clone, Debug, Default)]
pub struct ParsedPlacemarks {
    pub placemarks: Vec<Placemark>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Why a single coordinate tuple was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateTokenError {
    #[error("expected at least 2 comma-separated fields, found {0}")]
    TooFewFields(usize),

    #[error("field {field:?} is not a number")]
    NotANumber { field: String },

    #[error("field {field:?} is not finite")]
    NotFinite { field: String },
}

/// Parse one `lon,lat[,elevation]` tuple into a coordinate
///
/// Elevation and any further fields are ignored.
pub fn parse_coordinate_token(token: &str) -> Result<Coord<f64>, CoordinateTokenError> {
    let fields: Vec<&str> = token.split(',').collect();
    if fields.len() < 2 {
        return Err(CoordinateTokenError::TooFewFields(fields.len()));
    }

    let number = |field: &str| -> Result<f64, CoordinateTokenError> {
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|_| CoordinateTokenError::NotANumber {
                field: field.to_string(),
            })?;
        if !value.is_finite() {
            return Err(CoordinateTokenError::NotFinite {
                field: field.to_string(),
            });
        }
        Ok(value)
    };

    Ok(Coord {
        x: number(fields[0])?,
        y: number(fields[1])?,
    })
}

/// Parse a whitespace-separated coordinate payload
///
/// Returns the accepted coordinates and the rejected tokens with their reasons.
pub fn parse_coordinates(text: &str) -> (Vec<Coord<f64>>, Vec<(String, CoordinateTokenError)>) {
    let mut coords = Vec::new();
    let mut rejected = Vec::new();
    for token in text.split_whitespace() {
        match parse_coordinate_token(token) {
            Ok(coord) => coords.push(coord),
            Err(err) => rejected.push((token.to_string(), err)),
        }
    }
    (coords, rejected)
}

/// Read all `LineString` geometries with default options
pub fn parse(bytes: &[u8]) -> ParsedDocument {
    parse_with_options(bytes, &ParseOptions::default())
}

/// Read all `LineString` geometries, at any nesting depth, in document order
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_with_options(bytes: &[u8], options: &ParseOptions) -> ParsedDocument {
    let mut parsed = ParsedDocument::default();

    let Some(text) = decode(bytes, &mut parsed.diagnostics) else {
        return parsed;
    };
    let document = match load(text, &mut parsed.diagnostics) {
        Some(document) => document,
        None => return parsed,
    };

    for (index, element) in elements_named(&document, "LineString", *options).enumerate() {
        if let Some(polyline) = read_line(element, index, *options, &mut parsed.diagnostics) {
            parsed.polylines.push(polyline);
        }
    }

    tracing::debug!(
        "Parsed {} polylines with {} diagnostics",
        parsed.polylines.len(),
        parsed.diagnostics.len()
    );
    parsed
}

/// Read back `Placemark/Point` records, such as the ones the encoder writes
pub fn parse_placemark_points(bytes: &[u8], options: &ParseOptions) -> ParsedPlacemarks {
    let mut parsed = ParsedPlacemarks::default();

    let Some(text) = decode(bytes, &mut parsed.diagnostics) else {
        return parsed;
    };
    let Some(document) = load(text, &mut parsed.diagnostics) else {
        return parsed;
    };

    for (index, point) in elements_named(&document, "Point", *options).enumerate() {
        let Some(payload) = coordinates_text(point, *options) else {
            diagnostics::record(
                &mut parsed.diagnostics,
                Diagnostic::new(
                    DiagnosticKind::MissingCoordinates,
                    "Point has no coordinates",
                    Some(index),
                ),
            );
            continue;
        };
        let (coords, rejected) = parse_coordinates(&payload);
        record_rejected(&mut parsed.diagnostics, rejected, index);

        match coords.first() {
            Some(&position) => parsed.placemarks.push(Placemark::new(
                placemark_name(point, *options).unwrap_or_default(),
                position,
            )),
            None => diagnostics::record(
                &mut parsed.diagnostics,
                Diagnostic::new(
                    DiagnosticKind::InsufficientPoints,
                    "Point has no valid coordinate",
                    Some(index),
                ),
            ),
        }
    }

    parsed
}

fn decode<'a>(bytes: &'a [u8], sink: &mut Vec<Diagnostic>) -> Option<&'a str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(utils::strip_bom(text)),
        Err(err) => {
            diagnostics::record(
                sink,
                Diagnostic::new(
                    DiagnosticKind::DocumentParse,
                    format!("document is not valid UTF-8: {err}"),
                    None,
                ),
            );
            None
        }
    }
}

fn load<'a>(text: &'a str, sink: &mut Vec<Diagnostic>) -> Option<Document<'a>> {
    let xml_options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    match Document::parse_with_options(text, xml_options) {
        Ok(document) => Some(document),
        Err(err) => {
            diagnostics::record(
                sink,
                Diagnostic::new(
                    DiagnosticKind::DocumentParse,
                    format!("document is not well-formed XML: {err}"),
                    None,
                ),
            );
            None
        }
    }
}

/// Flatten the document tree into the elements called `local_name`,
/// regardless of how deeply folders, documents or multi-geometries nest them
fn elements_named<'a, 'input>(
    document: &'a Document<'input>,
    local_name: &'static str,
    options: ParseOptions,
) -> impl Iterator<Item = Node<'a, 'input>> {
    document
        .descendants()
        .filter(move |node| is_kml_element(*node, local_name, options))
}

fn is_kml_element(node: Node<'_, '_>, local_name: &str, options: ParseOptions) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && (!options.strict_namespace || node.tag_name().namespace() == Some(utils::KML_NAMESPACE))
}

/// Text of the `coordinates` child, if present and not blank
fn coordinates_text(element: Node<'_, '_>, options: ParseOptions) -> Option<String> {
    let coordinates = element
        .children()
        .find(|child| is_kml_element(*child, "coordinates", options))?;
    let text: String = coordinates
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

/// `name` of the closest enclosing placemark (or of the element itself)
fn placemark_name(element: Node<'_, '_>, options: ParseOptions) -> Option<String> {
    element
        .ancestors()
        .find(|n| is_kml_element(*n, "Placemark", options))?
        .children()
        .find(|n| is_kml_element(*n, "name", options))?
        .text()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn read_line(
    element: Node<'_, '_>,
    index: usize,
    options: ParseOptions,
    sink: &mut Vec<Diagnostic>,
) -> Option<Polyline> {
    let Some(payload) = coordinates_text(element, options) else {
        diagnostics::record(
            sink,
            Diagnostic::new(
                DiagnosticKind::MissingCoordinates,
                "LineString has no coordinates",
                Some(index),
            ),
        );
        return None;
    };

    let (coords, rejected) = parse_coordinates(&payload);
    record_rejected(sink, rejected, index);

    if coords.len() < 2 {
        diagnostics::record(
            sink,
            Diagnostic::new(
                DiagnosticKind::InsufficientPoints,
                format!(
                    "LineString has {} valid coordinate pair(s), at least 2 are required",
                    coords.len()
                ),
                Some(index),
            ),
        );
        return None;
    }

    // Cannot fail: at least two coordinates
    Polyline::new(coords, index, placemark_name(element, options)).ok()
}

fn record_rejected(
    sink: &mut Vec<Diagnostic>,
    rejected: Vec<(String, CoordinateTokenError)>,
    index: usize,
) {
    for (token, err) in rejected {
        diagnostics::record(
            sink,
            Diagnostic::new(
                DiagnosticKind::MalformedCoordinateToken,
                format!("skipped coordinate token {token:?}: {err}"),
                Some(index),
            ),
        );
    }
}
