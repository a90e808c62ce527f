//! Naming of generated markers

use crate::Marker;
use geo::Coord;

/// A named point destined for the output document
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placemark {
    pub name: String,
    /// `x` = longitude and `y` = latitude
    pub position: Coord<f64>,
}

impl Placemark {
    pub fn new(name: impl Into<String>, position: Coord<f64>) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// How sequence numbers are appended to the label prefix
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Numbering {
    /// Every marker gets the bare prefix, e.g. `TE`
    Constant,
    /// One running counter across all lines: `TE1 .. TEn`
    Global,
    /// Counter restarts at 1 on every line
    #[default]
    PerLine,
}

/// Label prefix plus numbering mode
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelConfig {
    pub prefix: String,
    pub numbering: Numbering,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            prefix: "TE".to_string(),
            numbering: Numbering::default(),
        }
    }
}

impl LabelConfig {
    pub fn new(prefix: impl Into<String>, numbering: Numbering) -> Self {
        Self {
            prefix: prefix.into(),
            numbering,
        }
    }

    fn label(&self, number: usize) -> String {
        match self.numbering {
            Numbering::Constant => self.prefix.clone(),
            Numbering::Global | Numbering::PerLine => format!("{}{}", self.prefix, number),
        }
    }
}

/// Turn per-line marker sequences into named placemarks, preserving order
///
/// Numbers start at 1. Lines without markers do not consume numbers.
pub fn label_markers<L>(lines: &[L], config: &LabelConfig) -> Vec<Placemark>
where
    L: AsRef<[Marker]>,
{
    let total = lines.iter().map(|l| l.as_ref().len()).sum();
    let mut placemarks = Vec::with_capacity(total);
    let mut global = 0usize;

    for line in lines {
        for (i, marker) in line.as_ref().iter().enumerate() {
            global += 1;
            let number = match config.numbering {
                Numbering::PerLine => i + 1,
                Numbering::Constant | Numbering::Global => global,
            };
            placemarks.push(Placemark::new(config.label(number), marker.position));
        }
    }

    placemarks
}
