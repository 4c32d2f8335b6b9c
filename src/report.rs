//! Structured run report for downstream tool consumption.
//!
//! Writes a JSON file alongside the output describing the run: formats,
//! paths, whether strand correction was on, and the resulting statistics.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::align::{AlignmentConfig, AlignmentSummary};
use crate::conversion::{ConversionConfig, ConversionSummary};

/// Complete report of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Tool version
    pub version: String,
    /// Timestamp of run (RFC 3339)
    pub timestamp: String,
    pub command: &'static str,
    pub input: FileInfo,
    pub output: FileInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip: Option<bool>,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Statistics {
    Alignment(AlignmentReport),
    Conversion(ConversionSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentReport {
    #[serde(flatten)]
    pub summary: AlignmentSummary,
    pub missing: usize,
    pub matched_percent: Option<f64>,
    pub missing_percent: Option<f64>,
}

impl RunReport {
    pub fn for_alignment(config: &AlignmentConfig, summary: &AlignmentSummary) -> Self {
        let stats = summary.statistics;
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: now(),
            command: "align",
            input: FileInfo {
                path: config.input.display().to_string(),
                format: config.input_format.to_string(),
            },
            output: FileInfo {
                path: config.output.display().to_string(),
                format: config.output_format.to_string(),
            },
            panel: Some(config.panel.display().to_string()),
            flip: Some(config.flip),
            statistics: Statistics::Alignment(AlignmentReport {
                summary: summary.clone(),
                missing: stats.missing(),
                matched_percent: stats.matched_percent().map(round1),
                missing_percent: stats.missing_percent().map(round1),
            }),
        }
    }

    pub fn for_conversion(config: &ConversionConfig, summary: &ConversionSummary) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: now(),
            command: "convert",
            input: FileInfo {
                path: config.input.display().to_string(),
                format: config.input_format.to_string(),
            },
            output: FileInfo {
                path: config.output.display().to_string(),
                format: config.output_format.to_string(),
            },
            panel: None,
            flip: None,
            statistics: Statistics::Conversion(*summary),
        }
    }

    /// Write the report as JSON next to the output.
    /// For `sample.txt`, writes `sample_report.json`.
    pub fn write(&self, output_path: &Path) -> std::io::Result<PathBuf> {
        let report_path = report_path(output_path);
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&report_path, json)?;
        tracing::info!("Wrote run report to {}", report_path.display());
        Ok(report_path)
    }
}

pub fn report_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    output_path.with_file_name(format!("{stem}_report.json"))
}

fn now() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
