//! Reference marker panel ("template") loading.
//!
//! A panel is an ordered list of markers the aligned output must cover. Two
//! on-disk layouts are accepted, chosen by file extension: PLINK `.bim` and
//! EIGENSTRAT `.snp`. Both are whitespace-separated with six columns and differ
//! only in whether the chromosome or the identifier comes first.

use std::{
    io::{self, BufRead},
    path::Path,
    str,
};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::{dtc::trim_line_end, smart_reader};

/// One reference panel entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRecord {
    pub id: String,
    pub chromosome: String,
    pub position: String,
    pub reference_a1: String,
    pub reference_a2: String,
    /// Third column of the panel (genetic distance or frequency). Carried only.
    pub value: f64,
}

/// Column layout of a panel file.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PanelLayout {
    /// `chrom id value pos a1 a2`
    Bim,
    /// `id chrom value pos a1 a2`
    Snp,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("unsupported panel file extension '{0}', only .bim and .snp are supported")]
    UnsupportedExtension(String),
}

impl PanelLayout {
    /// Picks the layout from the file name, looking past a trailing `.gz` or
    /// `.zip` so `panel.bim.gz` is still a `.bim` panel.
    pub fn from_path(path: &Path) -> Result<Self, PanelError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let stem = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".zip"))
            .unwrap_or(&name);
        let ext = Path::new(stem)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        match ext.as_str() {
            "bim" => Ok(Self::Bim),
            "snp" => Ok(Self::Snp),
            _ => Err(PanelError::UnsupportedExtension(ext)),
        }
    }

    /// Parses one line; `None` for lines that do not describe a marker.
    pub fn parse_line(self, line: &str) -> Option<TemplateRecord> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return None;
        }
        let value = fields[2].parse::<f64>().ok()?;

        let (chromosome, id) = match self {
            Self::Bim => (fields[0], fields[1]),
            Self::Snp => (fields[1], fields[0]),
        };

        Some(TemplateRecord {
            id: id.to_string(),
            chromosome: chromosome.to_string(),
            position: fields[3].to_string(),
            reference_a1: fields[4].to_string(),
            reference_a2: fields[5].to_string(),
            value,
        })
    }
}

/// Parsed panel in file order plus the count of dropped lines.
#[derive(Debug, Clone)]
pub struct Panel {
    pub layout: PanelLayout,
    pub records: Vec<TemplateRecord>,
    pub skipped_lines: usize,
}

impl Panel {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads a panel file, deciding the layout from its extension first.
pub fn load_panel(path: &Path) -> Result<Panel> {
    let layout = PanelLayout::from_path(path)?;
    let input = smart_reader::open_input(path)
        .with_context(|| format!("failed to open panel {}", path.display()))?;
    let panel = read_panel(input, layout)
        .with_context(|| format!("failed to read panel {}", path.display()))?;

    tracing::info!(
        layout = ?layout,
        markers = panel.len(),
        skipped = panel.skipped_lines,
        "loaded panel",
    );
    if panel.is_empty() {
        tracing::warn!(path = %path.display(), "panel contains no markers");
    }

    Ok(panel)
}

/// Reads panel lines as raw bytes. Lines that are not UTF-8 count as malformed;
/// only read failures are errors.
pub fn read_panel<R: BufRead>(mut input: R, layout: PanelLayout) -> io::Result<Panel> {
    let mut records = Vec::new();
    let mut skipped_lines = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let trimmed = trim_line_end(&buf);
        if trimmed.is_empty() || trimmed.starts_with(b"#") {
            continue;
        }
        match str::from_utf8(trimmed).ok().and_then(|line| layout.parse_line(line)) {
            Some(record) => records.push(record),
            None => {
                skipped_lines += 1;
                tracing::debug!(
                    line = %String::from_utf8_lossy(trimmed),
                    "skipping malformed panel line"
                );
            }
        }
    }

    Ok(Panel {
        layout,
        records,
        skipped_lines,
    })
}
