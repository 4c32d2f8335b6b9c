//! Output layouts for aligned and converted genotype files.
//!
//! Every layout is one fixed header line followed by one line per marker.
//! The layouts fall into two families that disagree on how a missing call is
//! written, see [`GenotypeFamily`].

use std::{
    fmt,
    io::{self, Write},
    str::FromStr,
};

use clap::ValueEnum;
use thiserror::Error;

use crate::panel::TemplateRecord;

/// Supported output layouts.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, ValueEnum)]
pub enum OutputFormat {
    /// `# rsid chromosome position genotype`, tab-separated.
    #[value(name = "23andme")]
    TwentyThreeAndMe,
    /// `# rsid chromosome position allele1 allele2`, tab-separated.
    Ancestry,
    /// `RSID,CHROMOSOME,POSITION,RESULT`, unquoted.
    #[value(name = "ftdnav2")]
    FtdnaV2,
    /// `RSID,CHROMOSOME,POSITION,RESULT`, every field double-quoted.
    #[value(name = "ftdnav1", alias = "myheritage")]
    FtdnaV1,
}

/// How a layout represents a marker call.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GenotypeFamily {
    /// One combined genotype column; missing data is `--`.
    Combined,
    /// Two allele columns; missing data is `0`.
    AllelePair,
}

/// A resolved marker call ready for emission.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Call {
    pub allele1: String,
    pub allele2: String,
    pub genotype: String,
}

impl Call {
    pub fn new(allele1: impl Into<String>, allele2: impl Into<String>) -> Self {
        let allele1 = allele1.into();
        let allele2 = allele2.into();
        let genotype = format!("{allele1}{allele2}");
        Self {
            allele1,
            allele2,
            genotype,
        }
    }
}

/// Coordinates and call of one output line.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub id: &'a str,
    pub chromosome: &'a str,
    pub position: &'a str,
    pub call: &'a Call,
}

const MISSING_GENOTYPE: &str = "--";
const MISSING_ALLELE: &str = "-";
const MISSING_ALLELE_CODE: &str = "0";

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::TwentyThreeAndMe => "23andme",
            Self::Ancestry => "ancestry",
            Self::FtdnaV2 => "ftdnav2",
            Self::FtdnaV1 => "ftdnav1",
        }
    }

    pub fn family(self) -> GenotypeFamily {
        match self {
            Self::Ancestry => GenotypeFamily::AllelePair,
            _ => GenotypeFamily::Combined,
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::TwentyThreeAndMe => "# rsid\tchromosome\tposition\tgenotype",
            Self::Ancestry => "# rsid\tchromosome\tposition\tallele1\tallele2",
            Self::FtdnaV2 | Self::FtdnaV1 => "RSID,CHROMOSOME,POSITION,RESULT",
        }
    }

    /// The call written when a sample allele is not a plain nucleotide.
    pub fn no_call(self) -> Call {
        match self.family() {
            GenotypeFamily::Combined => Call {
                allele1: MISSING_ALLELE.to_string(),
                allele2: MISSING_ALLELE.to_string(),
                genotype: MISSING_GENOTYPE.to_string(),
            },
            GenotypeFamily::AllelePair => Call::new(MISSING_ALLELE_CODE, MISSING_ALLELE_CODE),
        }
    }

    /// The call written for a panel marker the sample does not report.
    ///
    /// Allele-pair layouts carry the panel's reference alleles in the combined
    /// genotype while the alleles themselves are the `0` missing code.
    pub fn default_call(self, template: &TemplateRecord) -> Call {
        match self.family() {
            GenotypeFamily::Combined => self.no_call(),
            GenotypeFamily::AllelePair => Call {
                allele1: MISSING_ALLELE_CODE.to_string(),
                allele2: MISSING_ALLELE_CODE.to_string(),
                genotype: format!("{}{}", template.reference_a1, template.reference_a2),
            },
        }
    }

    pub fn write_header<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.header())
    }

    pub fn write_row<W: Write>(self, writer: &mut W, row: &Row<'_>) -> io::Result<()> {
        let Row {
            id,
            chromosome,
            position,
            call,
        } = row;
        match self {
            Self::TwentyThreeAndMe => {
                writeln!(writer, "{id}\t{chromosome}\t{position}\t{}", call.genotype)
            }
            Self::Ancestry => writeln!(
                writer,
                "{id}\t{chromosome}\t{position}\t{}\t{}",
                call.allele1, call.allele2
            ),
            Self::FtdnaV2 => writeln!(writer, "{id},{chromosome},{position},{}", call.genotype),
            Self::FtdnaV1 => writeln!(
                writer,
                "\"{id}\",\"{chromosome}\",\"{position}\",\"{}\"",
                call.genotype
            ),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a format tag names no known output layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported output format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "23andme" => Ok(Self::TwentyThreeAndMe),
            "ancestry" => Ok(Self::Ancestry),
            "ftdnav2" => Ok(Self::FtdnaV2),
            "ftdnav1" | "myheritage" => Ok(Self::FtdnaV1),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}
