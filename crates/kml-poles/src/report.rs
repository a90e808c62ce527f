//! Machine-readable summary of a run

use anyhow::Context;
use kml_poles_lib::{Diagnostic, PipelineOutput, PipelineSummary};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// JSON report written by `--report-json`
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub input: &'a Path,
    /// None when nothing was written
    pub output: Option<PathBuf>,
    pub summary: PipelineSummary,
    /// `(lat, lon)` of the center of all lines, for map previews
    pub center: Option<(f64, f64)>,
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> Report<'a> {
    pub fn from_output(input: &'a Path, output: Option<PathBuf>, result: &'a PipelineOutput) -> Self {
        Self {
            input,
            output,
            summary: result.summary(),
            center: result.center_lat_lon(),
            diagnostics: result.diagnostics(),
        }
    }

    /// Report for a document that produced no lines
    pub fn empty(input: &'a Path, diagnostics: &'a [Diagnostic]) -> Self {
        Self {
            input,
            output: None,
            summary: PipelineSummary {
                diagnostic_count: diagnostics.len(),
                ..PipelineSummary::default()
            },
            center: None,
            diagnostics,
        }
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("writing report {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("writing report {}", path.display()))?;
        tracing::debug!("Report written to {}", path.display());
        Ok(())
    }
}
