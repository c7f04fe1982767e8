// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON report output.
//!
//! The whole report is serialized once, after every benchmark has been
//! attempted, to stdout or to a file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{TraceBenchError, TraceBenchResult};
use crate::metrics::Report;

/// Where the report goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

/// JSON reporter for harness results.
#[derive(Debug, Clone, Default)]
pub struct JsonReporter {
    target: ReportTarget,
    pretty: bool,
}

impl JsonReporter {
    /// Reporter writing compact JSON to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write to a file instead of stdout.
    pub fn to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = ReportTarget::File(path.into());
        self
    }

    /// Indent the output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Serialize the report to a string.
    pub fn render(&self, report: &Report) -> TraceBenchResult<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }

    /// Serialize the report into `writer`, followed by a newline.
    pub fn write_to<W: Write>(&self, report: &Report, mut writer: W) -> TraceBenchResult<()> {
        let json = self.render(report)?;
        writeln!(writer, "{}", json).map_err(|e| TraceBenchError::Io {
            context: "writing report",
            source: e,
        })?;
        writer.flush().map_err(|e| TraceBenchError::Io {
            context: "flushing report",
            source: e,
        })
    }

    /// Emit the report to the configured target.
    pub fn emit(&self, report: &Report) -> TraceBenchResult<()> {
        match &self.target {
            ReportTarget::Stdout => self.write_to(report, std::io::stdout().lock()),
            ReportTarget::File(path) => {
                let file = File::create(path).map_err(|e| TraceBenchError::Io {
                    context: "creating report file",
                    source: e,
                })?;
                self.write_to(report, BufWriter::new(file))?;
                tracing::info!(path = %path.display(), "Report written");
                Ok(())
            }
        }
    }

    /// Load a previously written report.
    pub fn load(path: impl AsRef<Path>) -> TraceBenchResult<Report> {
        let file = File::open(path.as_ref()).map_err(|e| TraceBenchError::Io {
            context: "opening report file",
            source: e,
        })?;
        let report = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(report)
    }
}
