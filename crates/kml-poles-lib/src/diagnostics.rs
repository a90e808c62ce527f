//! Structured, non-fatal findings collected while reading a document

use std::fmt;

/// Category of a [`Diagnostic`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// The document is not valid UTF-8, not well-formed XML, or an unreadable archive
    DocumentParse,
    /// A line element has no `coordinates` child, or it is blank
    MissingCoordinates,
    /// A single coordinate tuple could not be read and was skipped
    MalformedCoordinateToken,
    /// A line element kept fewer than two coordinate pairs and was dropped
    InsufficientPoints,
}

impl DiagnosticKind {
    /// Stable identifier used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DocumentParse => "document_parse",
            DiagnosticKind::MissingCoordinates => "missing_coordinates",
            DiagnosticKind::MalformedCoordinateToken => "malformed_coordinate_token",
            DiagnosticKind::InsufficientPoints => "insufficient_points",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A skipped or malformed piece of input
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Document-order index of the element concerned, if any
    pub element_index: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, element_index: Option<usize>) -> Self {
        Self {
            kind,
            message: message.into(),
            element_index,
        }
    }

    /// Whether the whole document was rejected
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.kind == DiagnosticKind::DocumentParse
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element_index {
            Some(index) => write!(f, "[{}] element #{}: {}", self.kind, index, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Append `diagnostic` to `sink`, logging it as a warning
pub(crate) fn record(sink: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    tracing::warn!("{}", diagnostic);
    sink.push(diagnostic);
}
