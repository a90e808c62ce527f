use clap::{Parser, ValueEnum};
use kml_poles_lib::{
    DEFAULT_DOCUMENT_NAME, EncodeOptions, LabelConfig, Numbering, ParseOptions, PipelineConfig,
    StepPolicy,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// KML Poles - place evenly spaced pole placemarks along the routes of a KML file
pub struct Settings {
    /// KML or KMZ file with the routes (LineStrings)
    #[clap(value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the generated KML ("-" for stdout, a .kmz suffix writes a KMZ archive)
    #[clap(short, long, value_name = "FILE", default_value = "kml_with_poles.kml")]
    pub output: PathBuf,

    /// Spacing between poles, in the units of the input coordinates
    #[clap(short, long, default_value = "30")]
    pub interval: f64,

    /// Pole label prefix (e.g. TE or TN)
    #[clap(short, long, default_value = "TE")]
    pub label: String,

    /// How pole labels are numbered
    #[clap(long, value_enum, default_value_t = NumberingArg::PerLine)]
    pub numbering: NumberingArg,

    /// How step distances are generated along each line
    #[clap(long, value_enum, default_value_t = StepPolicyArg::FloorToUnit)]
    pub step_policy: StepPolicyArg,

    /// Name of the generated KML document
    #[clap(long, default_value = DEFAULT_DOCUMENT_NAME)]
    pub document_name: String,

    /// Only accept elements in the KML 2.2 namespace
    #[clap(long)]
    pub strict_namespace: bool,

    /// Write a JSON report with counts and diagnostics to this file
    #[clap(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Re-read the generated document and check every placemark survived
    #[clap(long)]
    pub verify: bool,

    /// Log filter used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    pub log_level: String,
}

/// Command line spelling of [`Numbering`]
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingArg {
    /// Every pole gets the bare label
    Constant,
    /// One counter across all lines
    Global,
    /// Counter restarts on every line
    PerLine,
}

impl From<NumberingArg> for Numbering {
    fn from(arg: NumberingArg) -> Self {
        match arg {
            NumberingArg::Constant => Numbering::Constant,
            NumberingArg::Global => Numbering::Global,
            NumberingArg::PerLine => Numbering::PerLine,
        }
    }
}

/// Command line spelling of [`StepPolicy`]
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicyArg {
    /// Whole-unit steps, endpoint always added
    FloorToUnit,
    /// Fractional steps, endpoint always added
    Exact,
}

impl From<StepPolicyArg> for StepPolicy {
    fn from(arg: StepPolicyArg) -> Self {
        match arg {
            StepPolicyArg::FloorToUnit => StepPolicy::FloorToUnit,
            StepPolicyArg::Exact => StepPolicy::Exact,
        }
    }
}

/// Where the generated document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget<'a> {
    Stdout,
    Kml(&'a Path),
    Kmz(&'a Path),
}

impl Settings {
    /// Build the pipeline configuration from the command line
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            interval: self.interval,
            label: LabelConfig::new(self.label.clone(), self.numbering.into()),
            step_policy: self.step_policy.into(),
            parse: ParseOptions {
                strict_namespace: self.strict_namespace,
            },
            encode: EncodeOptions {
                document_name: Some(self.document_name.clone()).filter(|n| !n.is_empty()),
            },
        }
    }

    pub fn output_target(&self) -> OutputTarget<'_> {
        if self.output.as_os_str() == "-" {
            return OutputTarget::Stdout;
        }
        let is_kmz = self
            .output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("kmz"));
        if is_kmz {
            OutputTarget::Kmz(&self.output)
        } else {
            OutputTarget::Kml(&self.output)
        }
    }
}
