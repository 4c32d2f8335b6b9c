//! Alignment of a sample against a reference marker panel.
//!
//! The panel is walked in file order and every entry yields exactly one output
//! line, whether or not the sample reports that marker. Coordinates always come
//! from the panel.

use std::{
    collections::HashMap,
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    dtc::{self, Record as DtcRecord, SampleFormat},
    format::{OutputFormat, Row},
    panel::{self, TemplateRecord},
    strand::{self, Correction},
};

/// Identifier lookup over one sample's records.
///
/// A repeated identifier keeps the record that appeared last.
#[derive(Debug, Default)]
pub struct SampleIndex {
    records: HashMap<String, DtcRecord>,
}

impl SampleIndex {
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DtcRecord>,
    {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self { records }
    }

    pub fn get(&self, id: &str) -> Option<&DtcRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Match statistics accumulated over one panel walk.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct AlignmentStatistics {
    pub total: usize,
    pub matched: usize,
    pub no_calls: usize,
    pub reference_fallbacks: usize,
    pub complemented: usize,
    pub unchanged: usize,
}

impl AlignmentStatistics {
    pub fn missing(&self) -> usize {
        self.total - self.matched
    }

    /// `None` for an empty panel.
    pub fn matched_percent(&self) -> Option<f64> {
        percent(self.matched, self.total)
    }

    /// `None` for an empty panel.
    pub fn missing_percent(&self) -> Option<f64> {
        percent(self.missing(), self.total)
    }

    fn record_correction(&mut self, correction: Correction) {
        match correction {
            Correction::NoCall => self.no_calls += 1,
            Correction::ReferenceFallback => self.reference_fallbacks += 1,
            Correction::Complemented => self.complemented += 1,
            Correction::Unchanged => self.unchanged += 1,
        }
    }

    /// Log the summary; does nothing for an empty panel.
    pub fn log_summary(&self) {
        let (Some(matched), Some(missing)) = (self.matched_percent(), self.missing_percent())
        else {
            tracing::info!("panel contained no markers");
            return;
        };

        tracing::info!("Total SNPs in template: {}", self.total);
        tracing::info!("Matched SNPs: {} ({:.1}%)", self.matched, matched);
        tracing::info!("Missing SNPs: {} ({:.1}%)", self.missing(), missing);
    }
}

fn percent(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(part as f64 / total as f64 * 100.0)
    }
}

/// Walks `panel` in order, writing one line per entry after the header.
pub fn align_records<'a, W, I>(
    index: &SampleIndex,
    panel: I,
    output_format: OutputFormat,
    flip: bool,
    writer: &mut W,
) -> io::Result<AlignmentStatistics>
where
    W: Write,
    I: IntoIterator<Item = &'a TemplateRecord>,
{
    let mut stats = AlignmentStatistics::default();
    output_format.write_header(writer)?;

    for template in panel {
        stats.total += 1;

        let call = match index.get(&template.id) {
            Some(record) => {
                stats.matched += 1;
                if flip {
                    let (call, correction) =
                        strand::correct(&record.allele1, &record.allele2, template, output_format);
                    stats.record_correction(correction);
                    call
                } else {
                    record.call()
                }
            }
            None => output_format.default_call(template),
        };

        output_format.write_row(
            writer,
            &Row {
                id: &template.id,
                chromosome: &template.chromosome,
                position: &template.position,
                call: &call,
            },
        )?;
    }

    Ok(stats)
}

/// Configuration required to drive an alignment.
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    pub input: PathBuf,
    pub input_format: SampleFormat,
    pub panel: PathBuf,
    pub output: PathBuf,
    pub output_format: OutputFormat,
    pub flip: bool,
}

/// Outcome of [`align_file`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlignmentSummary {
    pub sample_records: usize,
    pub sample_skipped_lines: usize,
    pub panel_skipped_lines: usize,
    pub statistics: AlignmentStatistics,
}

/// Align a sample file against a panel file and write the result.
pub fn align_file(config: &AlignmentConfig) -> Result<AlignmentSummary> {
    tracing::info!(
        input_format = %config.input_format,
        output_format = %config.output_format,
        input = %config.input.display(),
        panel = %config.panel.display(),
        output = %config.output.display(),
        flip = config.flip,
        "starting alignment",
    );

    let sample = dtc::load_sample(&config.input, config.input_format)?;
    let panel = panel::load_panel(&config.panel).context("failed to load panel")?;

    let sample_records = sample.records.len();
    let index = SampleIndex::build(sample.records);

    let output = fs::File::create(&config.output)
        .with_context(|| format!("failed to create output {}", config.output.display()))?;
    let mut writer = BufWriter::new(output);
    let statistics = align_records(
        &index,
        &panel.records,
        config.output_format,
        config.flip,
        &mut writer,
    )
    .and_then(|stats| writer.flush().map(|()| stats))
    .with_context(|| format!("failed to write output {}", config.output.display()))?;

    statistics.log_summary();

    Ok(AlignmentSummary {
        sample_records,
        sample_skipped_lines: sample.skipped_lines,
        panel_skipped_lines: panel.skipped_lines,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, a1: &str, a2: &str) -> DtcRecord {
        DtcRecord {
            id: id.into(),
            chromosome: "9".into(),
            position: "999".into(),
            allele1: a1.into(),
            allele2: a2.into(),
            genotype: format!("{a1}{a2}"),
        }
    }

    fn template(id: &str, chrom: &str, pos: &str, a1: &str, a2: &str) -> TemplateRecord {
        TemplateRecord {
            id: id.into(),
            chromosome: chrom.into(),
            position: pos.into(),
            reference_a1: a1.into(),
            reference_a2: a2.into(),
            value: 1e-2,
        }
    }

    fn run(
        index: &SampleIndex,
        panel: &[TemplateRecord],
        format: OutputFormat,
        flip: bool,
    ) -> (String, AlignmentStatistics) {
        let mut buf = Vec::new();
        let stats = align_records(index, panel, format, flip, &mut buf).unwrap();
        (String::from_utf8(buf).unwrap(), stats)
    }

    #[test]
    fn index_keeps_last_duplicate() {
        let index = SampleIndex::build(vec![record("rs1", "A", "A"), record("rs1", "G", "G")]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("rs1").unwrap().genotype, "GG");
        assert!(SampleIndex::build(Vec::new()).is_empty());
    }

    #[test]
    fn unmatched_markers_use_layout_default() {
        let index = SampleIndex::build(vec![record("rs1", "A", "G")]);
        let panel = [
            template("rs1", "chrom1", "pos1", "A", "G"),
            template("rs2", "chrom2", "pos2", "C", "C"),
        ];

        let (out, stats) = run(&index, &panel, OutputFormat::TwentyThreeAndMe, false);
        assert_eq!(
            out,
            "# rsid\tchromosome\tposition\tgenotype\nrs1\tchrom1\tpos1\tAG\nrs2\tchrom2\tpos2\t--\n"
        );
        assert_eq!(stats.total, 2);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.missing(), 1);
        assert_eq!(stats.matched_percent(), Some(50.0));
        assert_eq!(stats.missing_percent(), Some(50.0));

        let (out, _) = run(&index, &panel, OutputFormat::Ancestry, false);
        assert!(out.ends_with("rs2\tchrom2\tpos2\t0\t0\n"));
    }

    #[test]
    fn panel_coordinates_win_over_sample() {
        let index = SampleIndex::build(vec![record("rs1", "T", "T")]);
        let panel = [template("rs1", "1", "12345", "A", "T")];
        let (out, _) = run(&index, &panel, OutputFormat::FtdnaV2, false);
        assert_eq!(out.lines().nth(1), Some("rs1,1,12345,TT"));
    }

    #[test]
    fn flip_complements_homozygous_mismatch() {
        let index = SampleIndex::build(vec![record("rs1", "C", "C")]);
        let panel = [template("rs1", "1", "10", "G", "G")];
        let (out, stats) = run(&index, &panel, OutputFormat::Ancestry, true);
        assert_eq!(out.lines().nth(1), Some("rs1\t1\t10\tG\tG"));
        assert_eq!(stats.complemented, 1);
    }

    #[test]
    fn flip_counts_each_path() {
        let index = SampleIndex::build(vec![
            record("rs1", "-", "-"),
            record("rs2", "A", "G"),
            record("rs3", "A", "A"),
            record("rs4", "C", "C"),
        ]);
        let panel = [
            template("rs1", "1", "1", "A", "G"),
            template("rs2", "1", "2", "C", "T"),
            template("rs3", "1", "3", "G", "C"),
            template("rs4", "1", "4", "C", "G"),
            template("rs5", "1", "5", "C", "G"),
        ];
        let (out, stats) = run(&index, &panel, OutputFormat::TwentyThreeAndMe, true);
        let genotypes: Vec<_> = out
            .lines()
            .skip(1)
            .map(|line| line.rsplit('\t').next().unwrap())
            .collect();
        assert_eq!(genotypes, ["--", "CT", "TT", "CC", "--"]);
        assert_eq!(stats.no_calls, 1);
        assert_eq!(stats.reference_fallbacks, 1);
        assert_eq!(stats.complemented, 1);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.matched, 4);
    }

    #[test]
    fn empty_panel_has_no_percentages() {
        let index = SampleIndex::default();
        let (out, stats) = run(&index, &[], OutputFormat::FtdnaV1, false);
        assert_eq!(out, "RSID,CHROMOSOME,POSITION,RESULT\n");
        assert_eq!(stats.total, 0);
        assert_eq!(stats.matched_percent(), None);
        stats.log_summary();
    }
}
