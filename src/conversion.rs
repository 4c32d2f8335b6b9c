use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    dtc::{self, Record as DtcRecord, SampleFormat},
    format::{OutputFormat, Row},
};

/// Configuration required to drive a conversion.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub input: PathBuf,
    pub input_format: SampleFormat,
    pub output: PathBuf,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct ConversionSummary {
    pub records: usize,
    pub skipped_lines: usize,
}

/// Re-encode a sample file in another vendor layout.
pub fn convert_file(config: &ConversionConfig) -> Result<ConversionSummary> {
    tracing::info!(
        input_format = %config.input_format,
        output_format = %config.output_format,
        input = %config.input.display(),
        output = %config.output.display(),
        "starting conversion",
    );

    let sample = dtc::load_sample(&config.input, config.input_format)?;

    let output = fs::File::create(&config.output)
        .with_context(|| format!("failed to create output {}", config.output.display()))?;
    let mut writer = BufWriter::new(output);
    write_records(&sample.records, config.output_format, &mut writer)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write output {}", config.output.display()))?;

    Ok(ConversionSummary {
        records: sample.records.len(),
        skipped_lines: sample.skipped_lines,
    })
}

/// Write the header and one line per record, keeping the sample's own calls.
pub fn write_records<W: Write>(
    records: &[DtcRecord],
    format: OutputFormat,
    writer: &mut W,
) -> io::Result<()> {
    format.write_header(writer)?;
    for record in records {
        let call = record.call();
        format.write_row(
            writer,
            &Row {
                id: &record.id,
                chromosome: &record.chromosome,
                position: &record.position,
                call: &call,
            },
        )?;
    }
    Ok(())
}
