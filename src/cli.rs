use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    align::{AlignmentConfig, AlignmentSummary, align_file},
    conversion::{ConversionConfig, ConversionSummary, convert_file},
    dtc::SampleFormat,
    format::OutputFormat,
    report::RunReport,
};

#[derive(Debug, Parser)]
#[command(
    name = "terraseq",
    author,
    version,
    about = "Convert and align DNA data from commercial genetic testing services",
    long_about = None
)]
struct Cli {
    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Converts a DNA file to another format.
    Convert(ConvertArgs),
    /// Aligns a DNA file against a reference marker panel.
    Align(AlignArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Path to the input file (e.g. input.txt)
    #[arg(short = 'i', long = "in-file", alias = "inFile", value_name = "FILE")]
    in_file: PathBuf,

    /// Format of the input file
    #[arg(short = 'f', long = "in-format", alias = "inFormat", value_enum)]
    in_format: SampleFormat,

    /// Path for the output file (e.g. output.txt)
    #[arg(short = 'o', long = "out-file", alias = "outFile", value_name = "FILE")]
    out_file: PathBuf,

    /// Format of the output file
    #[arg(
        short = 't',
        long = "out-format",
        alias = "outFormat",
        value_enum,
        default_value_t = OutputFormat::TwentyThreeAndMe
    )]
    out_format: OutputFormat,

    /// Write a JSON run report next to the output file
    #[arg(long)]
    report: bool,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args)]
struct AlignArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Reference panel to align against (.bim or .snp)
    #[arg(short = 'a', long = "align-file", alias = "alignFile", value_name = "FILE")]
    align_file: PathBuf,

    /// Flip homozygous calls reported on the opposite strand to the panel's
    #[arg(long)]
    flip: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Convert(args) => {
            let config = ConversionConfig {
                input: args.common.in_file,
                input_format: args.common.in_format,
                output: args.common.out_file,
                output_format: args.common.out_format,
            };
            let summary = convert_file(&config).context("conversion failed")?;
            print_conversion_summary(&config, &summary);
            if args.common.report {
                RunReport::for_conversion(&config, &summary)
                    .write(&config.output)
                    .context("failed to write run report")?;
            }
        }
        Command::Align(args) => {
            let config = AlignmentConfig {
                input: args.common.in_file,
                input_format: args.common.in_format,
                panel: args.align_file,
                output: args.common.out_file,
                output_format: args.common.out_format,
                flip: args.flip,
            };
            let summary = align_file(&config).context("alignment failed")?;
            print_alignment_summary(&config, &summary);
            if args.common.report {
                RunReport::for_alignment(&config, &summary)
                    .write(&config.output)
                    .context("failed to write run report")?;
            }
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
    Ok(())
}

fn print_conversion_summary(config: &ConversionConfig, summary: &ConversionSummary) {
    println!(
        "Converted {records} records from {from} to {to}.",
        records = summary.records,
        from = config.input_format,
        to = config.output_format,
    );

    if summary.skipped_lines > 0 {
        println!(
            "Ignored {count} malformed input lines.",
            count = summary.skipped_lines
        );
    }
}

fn print_alignment_summary(config: &AlignmentConfig, summary: &AlignmentSummary) {
    let stats = &summary.statistics;
    match (stats.matched_percent(), stats.missing_percent()) {
        (Some(matched), Some(missing)) => {
            println!("Total SNPs in template: {}", stats.total);
            println!("Matched SNPs: {} ({matched:.1}%)", stats.matched);
            println!("Missing SNPs: {} ({missing:.1}%)", stats.missing());
        }
        _ => println!("Template contained no SNPs."),
    }

    if config.flip && stats.matched > 0 {
        println!(
            "Strand correction: {flipped} complemented, {fallback} heterozygous replaced by reference, {nocall} no-calls, {kept} unchanged.",
            flipped = stats.complemented,
            fallback = stats.reference_fallbacks,
            nocall = stats.no_calls,
            kept = stats.unchanged,
        );
    }

    if summary.sample_skipped_lines > 0 || summary.panel_skipped_lines > 0 {
        println!(
            "Ignored {sample} malformed input lines and {panel} malformed template lines.",
            sample = summary.sample_skipped_lines,
            panel = summary.panel_skipped_lines,
        );
    }
}
