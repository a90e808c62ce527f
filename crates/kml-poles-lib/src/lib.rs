//! KML Poles Library - Route Segmentation and Placemark Generation
//!
//! This library reads line routes out of KML documents, places markers at a
//! fixed spacing along every line, and writes the markers back as a new KML
//! document of named placemarks.
//!
//! # Architecture
//!
//! - **[`parser`]**: Tolerant `LineString` extraction into [`Polyline`]s, with
//!   structured [`Diagnostic`]s instead of hard failures
//! - **[`segment()`]**: Planar arc-length stepping along one polyline, always
//!   ending on the final vertex
//! - **[`label_markers`]**: Constant, global or per-line numbered names
//! - **[`encode`]**: Indented UTF-8 KML output
//! - **[`process`]**: The whole pipeline for one document, KML or KMZ
//!
//! Distances are measured on raw coordinate values; no geodesic correction is
//! applied.

mod diagnostics;
mod encoder;
pub mod kmz;
mod labels;
pub mod parser;
mod pipeline;
mod polyline;
mod segment;
pub mod utils;

// Public API exports
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use encoder::{DEFAULT_DOCUMENT_NAME, EncodeOptions, encode};
pub use labels::{LabelConfig, Numbering, Placemark, label_markers};
pub use parser::{
    ParseOptions, ParsedDocument, ParsedPlacemarks, parse, parse_placemark_points,
    parse_with_options,
};
pub use pipeline::{
    DEFAULT_INTERVAL, PipelineConfig, PipelineOutput, PipelineSummary, SegmentedLine, process,
};
pub use polyline::Polyline;
pub use segment::{MAX_MARKERS_PER_LINE, Marker, StepPolicy, segment, segment_with_policy};

/// Error types for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("No valid lines found ({} diagnostics)", .diagnostics.len())]
    NoValidLines { diagnostics: Vec<Diagnostic> },

    #[error("XML writing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("KMZ archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("KMZ archive contains no .kml document")]
    MissingArchiveEntry,

    #[error("Document inflates past the {limit} byte limit")]
    DocumentTooLarge { limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
