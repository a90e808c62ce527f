//! KML Poles - command line shell
//!
//! Reads one route document, places poles along every line and writes the
//! regenerated KML (or KMZ) document.

mod logging;
mod report;
mod settings;

use anyhow::{Context, bail};
use clap::Parser;
use kml_poles_lib::{Error, ParseOptions, PipelineOutput, kmz, parse_placemark_points, process};
use report::Report;
use settings::{OutputTarget, Settings};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code when the input holds no usable line
const EXIT_NO_LINES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Written,
    NoValidLines,
}

fn main() -> ExitCode {
    let settings = Settings::parse();
    logging::setup_logging(&settings.log_level);

    match run(&settings) {
        Ok(Outcome::Written) => ExitCode::SUCCESS,
        Ok(Outcome::NoValidLines) => ExitCode::from(EXIT_NO_LINES),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> anyhow::Result<Outcome> {
    let bytes = std::fs::read(&settings.input)
        .with_context(|| format!("reading {}", settings.input.display()))?;
    tracing::info!(
        "Loaded {} ({} bytes)",
        settings.input.display(),
        bytes.len()
    );

    let config = settings.pipeline_config();
    let output = match process(&bytes, &config) {
        Ok(output) => output,
        Err(Error::NoValidLines { diagnostics }) => {
            tracing::error!(
                "No valid lines found in {} ({} diagnostics)",
                settings.input.display(),
                diagnostics.len()
            );
            if let Some(path) = &settings.report_json {
                Report::empty(&settings.input, &diagnostics).write_to(path)?;
            }
            return Ok(Outcome::NoValidLines);
        }
        Err(err) => return Err(err).context("processing document"),
    };

    if settings.verify {
        verify(&output, &config.parse)?;
    }

    let written = write_output(settings, output.document())?;

    let summary = output.summary();
    tracing::info!(
        "Lines: {}, poles added: {}, skipped input: {}",
        summary.line_count,
        summary.total_points,
        summary.diagnostic_count
    );
    if summary.total_points == 0 {
        tracing::warn!("All lines have zero length, the document has no poles");
    }

    if let Some(path) = &settings.report_json {
        Report::from_output(&settings.input, written, &output).write_to(path)?;
    }

    Ok(Outcome::Written)
}

/// Write the document where the settings ask; returns the path written, if any
fn write_output(settings: &Settings, document: &[u8]) -> anyhow::Result<Option<PathBuf>> {
    match settings.output_target() {
        OutputTarget::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(document).context("writing to stdout")?;
            stdout.flush().context("writing to stdout")?;
            Ok(None)
        }
        OutputTarget::Kml(path) => {
            std::fs::write(path, document).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        OutputTarget::Kmz(path) => {
            let archive = kmz::write_kmz(document).context("packing KMZ")?;
            std::fs::write(path, archive).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
    }
}

/// Re-read the generated document and compare it with the placemarks in memory
fn verify(output: &PipelineOutput, options: &ParseOptions) -> anyhow::Result<()> {
    let reread = parse_placemark_points(output.document(), options);
    if !reread.diagnostics.is_empty() {
        bail!(
            "generated document does not re-read cleanly: {}",
            reread.diagnostics[0]
        );
    }
    if reread.placemarks.as_slice() != output.placemarks() {
        bail!(
            "generated document holds {} placemarks, expected {}",
            reread.placemarks.len(),
            output.total_points()
        );
    }
    tracing::info!("Verified {} placemarks", reread.placemarks.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const ROUTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Folder>
      <Placemark>
        <name>Feeder</name>
        <LineString>
          <coordinates>0,0,0 0,10,0 0,20,0</coordinates>
        </LineString>
      </Placemark>
    </Folder>
  </Document>
</kml>"#;

    fn settings(dir: &Path, input: &str, output: &str, extra: &[&str]) -> Settings {
        let input = dir.join(input);
        let output = dir.join(output);
        let mut args = vec![
            "kml-poles".to_string(),
            input.display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        Settings::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_run_writes_kml_and_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("route.kml"), ROUTE).unwrap();
        let report_path = dir.path().join("report.json");
        let settings = settings(
            dir.path(),
            "route.kml",
            "poles.kml",
            &[
                "--interval",
                "5",
                "--verify",
                "--report-json",
                report_path.to_str().unwrap(),
            ],
        );

        assert_eq!(run(&settings).unwrap(), Outcome::Written);

        let written = std::fs::read(dir.path().join("poles.kml")).unwrap();
        let reread = parse_placemark_points(&written, &ParseOptions::default());
        let names: Vec<_> = reread.placemarks.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["TE1", "TE2", "TE3", "TE4", "TE5"]);

        let report: serde_json::Value =
            serde_json::from_slice(&std::fs::read(report_path).unwrap()).unwrap();
        assert_eq!(report["summary"]["total_points"], 5);
        assert_eq!(report["summary"]["line_count"], 1);
    }

    #[test]
    fn test_run_writes_kmz() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("route.kml"), ROUTE).unwrap();
        let settings = settings(dir.path(), "route.kml", "poles.kmz", &["--interval", "7"]);

        assert_eq!(run(&settings).unwrap(), Outcome::Written);

        let archive = std::fs::read(dir.path().join("poles.kmz")).unwrap();
        assert!(kmz::is_kmz(&archive));
        let document = kmz::read_kmz(&archive).unwrap();
        let reread = parse_placemark_points(&document, &ParseOptions::default());
        assert_eq!(reread.placemarks.len(), 4);
    }

    #[test]
    fn test_run_without_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.kml"), &ROUTE[..40]).unwrap();
        let report_path = dir.path().join("report.json");
        let settings = settings(
            dir.path(),
            "broken.kml",
            "poles.kml",
            &["--report-json", report_path.to_str().unwrap()],
        );

        assert_eq!(run(&settings).unwrap(), Outcome::NoValidLines);
        assert!(!dir.path().join("poles.kml").exists());

        let report: serde_json::Value =
            serde_json::from_slice(&std::fs::read(report_path).unwrap()).unwrap();
        assert_eq!(report["diagnostics"][0]["kind"], "DocumentParse");
    }

    #[test]
    fn test_run_accepts_sub_unit_interval() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("route.kml"), ROUTE).unwrap();
        let settings = settings(
            dir.path(),
            "route.kml",
            "poles.kml",
            &["--interval", "0.5", "--verify"],
        );

        assert_eq!(run(&settings).unwrap(), Outcome::Written);
        let written = std::fs::read(dir.path().join("poles.kml")).unwrap();
        let reread = parse_placemark_points(&written, &ParseOptions::default());
        assert_eq!(reread.placemarks.len(), 21);
    }

    #[test]
    fn test_run_rejects_bad_interval() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("route.kml"), ROUTE).unwrap();
        let settings = settings(dir.path(), "route.kml", "poles.kml", &["--interval", "0"]);

        assert!(run(&settings).is_err());
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), "absent.kml", "poles.kml", &[]);
        assert!(run(&settings).is_err());
    }
}
