use std::{
    fmt,
    io::{self, BufRead},
    path::Path,
    str::{self, FromStr, Utf8Error},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use thiserror::Error;

use crate::{format::Call, smart_reader};

/// Vendor layout of a direct-to-consumer genotype export.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, ValueEnum)]
pub enum SampleFormat {
    /// 23andMe tab-separated export with a combined genotype column.
    #[value(name = "23andme")]
    TwentyThreeAndMe,
    /// AncestryDNA tab-separated export with two allele columns.
    Ancestry,
    /// FamilyTreeDNA v2 comma-separated export.
    #[value(name = "ftdnav2")]
    FtdnaV2,
    /// FamilyTreeDNA v1 / MyHeritage quoted comma-separated export.
    #[value(name = "ftdnav1", alias = "myheritage")]
    FtdnaV1,
}

impl SampleFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::TwentyThreeAndMe => "23andme",
            Self::Ancestry => "ancestry",
            Self::FtdnaV2 => "ftdnav2",
            Self::FtdnaV1 => "ftdnav1",
        }
    }

    fn delimiter(self) -> char {
        match self {
            Self::TwentyThreeAndMe | Self::Ancestry => '\t',
            Self::FtdnaV2 | Self::FtdnaV1 => ',',
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::TwentyThreeAndMe => "rsid\tchromosome\tposition\tgenotype",
            Self::Ancestry => "rsid\tchromosome\tposition\tallele1\tallele2",
            Self::FtdnaV2 | Self::FtdnaV1 => "RSID,CHROMOSOME,POSITION,RESULT",
        }
    }

    fn min_fields(self) -> usize {
        match self {
            Self::Ancestry => 5,
            _ => 4,
        }
    }

    fn is_quoted(self) -> bool {
        matches!(self, Self::FtdnaV1)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a format tag names no known vendor layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported input format: {0}")]
pub struct UnknownSampleFormat(pub String);

impl FromStr for SampleFormat {
    type Err = UnknownSampleFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "23andme" => Ok(Self::TwentyThreeAndMe),
            "ancestry" => Ok(Self::Ancestry),
            "ftdnav2" => Ok(Self::FtdnaV2),
            "ftdnav1" | "myheritage" => Ok(Self::FtdnaV1),
            _ => Err(UnknownSampleFormat(s.to_string())),
        }
    }
}

/// A single marker call from a direct-to-consumer text export.
///
/// `position` is kept as the vendor wrote it; nothing downstream needs it as
/// a number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub id: String,
    pub chromosome: String,
    pub position: String,
    pub allele1: String,
    pub allele2: String,
    pub genotype: String,
}

impl Record {
    pub fn call(&self) -> Call {
        Call {
            allele1: self.allele1.clone(),
            allele2: self.allele2.clone(),
            genotype: self.genotype.clone(),
        }
    }

    pub fn is_homozygous(&self) -> bool {
        self.allele1 == self.allele2
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.id, self.chromosome, self.position, self.genotype
        )
    }
}

/// Iterator over marker records in a vendor genotype export.
///
/// Lines are read as raw bytes; a data line that is not UTF-8 is reported as
/// a malformed record rather than a read failure.
pub struct Reader<R> {
    inner: R,
    format: SampleFormat,
    line: u64,
    buf: Vec<u8>,
}

impl<R> Reader<R>
where
    R: BufRead,
{
    pub fn new(inner: R, format: SampleFormat) -> Self {
        Self {
            inner,
            format,
            line: 0,
            buf: Vec::new(),
        }
    }
}

impl<R> Iterator for Reader<R>
where
    R: BufRead,
{
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let trimmed = trim_line_end(&self.buf);
                    if trimmed.is_empty() || trimmed.starts_with(b"#") {
                        continue;
                    }

                    let parsed = str::from_utf8(trimmed)
                        .map_err(ParseErrorKind::InvalidUtf8)
                        .and_then(|line| parse_record(line, self.format));
                    match parsed {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(kind) => {
                            return Some(Err(ParseError {
                                line: self.line,
                                raw: String::from_utf8_lossy(trimmed).into_owned(),
                                kind,
                            }));
                        }
                    }
                }
                Err(e) => {
                    return Some(Err(ParseError {
                        line: self.line,
                        raw: String::new(),
                        kind: ParseErrorKind::Io(e),
                    }));
                }
            }
        }
    }
}

/// Strips the trailing `\n` / `\r\n` of a raw line.
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Errors that can arise while parsing a marker record.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: u64,
    pub raw: String,
    #[source]
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("expected at least {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("missing genotype field")]
    MissingGenotype,
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(Utf8Error),
}

/// Parses one non-comment line. `Ok(None)` means the line was the vendor header.
fn parse_record(line: &str, format: SampleFormat) -> Result<Option<Record>, ParseErrorKind> {
    if line == format.header() {
        return Ok(None);
    }

    let fields: Vec<&str> = line
        .split(format.delimiter())
        .map(|field| {
            if format.is_quoted() {
                strip_quotes(field)
            } else {
                field
            }
        })
        .collect();

    if format.is_quoted() && fields.join(",") == format.header() {
        return Ok(None);
    }

    if fields.len() < format.min_fields() {
        return Err(ParseErrorKind::FieldCount {
            expected: format.min_fields(),
            found: fields.len(),
        });
    }

    let (allele1, allele2, genotype) = match format {
        SampleFormat::Ancestry => {
            let (a1, a2) = (fields[3], fields[4]);
            (a1.to_string(), a2.to_string(), format!("{a1}{a2}"))
        }
        _ => {
            let (a1, a2) = split_genotype(fields[3]).ok_or(ParseErrorKind::MissingGenotype)?;
            (a1, a2, fields[3].to_string())
        }
    };

    Ok(Some(Record {
        id: fields[0].to_string(),
        chromosome: fields[1].to_string(),
        position: fields[2].to_string(),
        allele1,
        allele2,
        genotype,
    }))
}

/// Splits a combined genotype into its two allele characters.
///
/// A single-character call is homozygous shorthand.
pub fn split_genotype(genotype: &str) -> Option<(String, String)> {
    let mut chars = genotype.chars();
    let first = chars.next()?;
    let second = chars.next().unwrap_or(first);
    Some((first.to_string(), second.to_string()))
}

fn strip_quotes(field: &str) -> &str {
    field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(field)
}

/// Parsed sample export plus the count of lines dropped as malformed.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub format: SampleFormat,
    pub records: Vec<Record>,
    pub skipped_lines: usize,
}

/// Reads a whole sample file, skipping malformed lines.
///
/// Read failures abort; malformed lines are counted and logged at debug level.
pub fn load_sample(path: &Path, format: SampleFormat) -> Result<SampleData> {
    let input = smart_reader::open_input(path)
        .with_context(|| format!("failed to open input {}", path.display()))?;
    let sample = read_sample(input, format)
        .with_context(|| format!("failed to read input {}", path.display()))?;

    tracing::info!(
        format = %format,
        records = sample.records.len(),
        skipped = sample.skipped_lines,
        "loaded sample file",
    );

    Ok(sample)
}

/// Drains a reader into a [`SampleData`].
pub fn read_sample<R: BufRead>(input: R, format: SampleFormat) -> io::Result<SampleData> {
    let mut records = Vec::new();
    let mut skipped_lines = 0;

    for result in Reader::new(input, format) {
        match result {
            Ok(record) => records.push(record),
            Err(ParseError {
                kind: ParseErrorKind::Io(e),
                ..
            }) => return Err(e),
            Err(e) => {
                skipped_lines += 1;
                tracing::debug!(error = %e, "skipping malformed input line");
            }
        }
    }

    Ok(SampleData {
        format,
        records,
        skipped_lines,
    })
}
