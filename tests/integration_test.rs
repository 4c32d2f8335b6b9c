use std::{fs, io, path::PathBuf};

use tempfile::tempdir;
use terraseq::{
    AlignmentConfig, ConversionConfig, OutputFormat, SampleFormat, align_file, convert_file,
};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

fn align_config(
    input: PathBuf,
    input_format: SampleFormat,
    panel: PathBuf,
    output: PathBuf,
    output_format: OutputFormat,
    flip: bool,
) -> AlignmentConfig {
    AlignmentConfig {
        input,
        input_format,
        panel,
        output,
        output_format,
        flip,
    }
}

const PANEL_SNP: &str = "rs1 chrom1 1e-2 pos1 A G\nrs2 chrom2 1e-3 pos2 C C\n";

#[test]
fn align_fills_missing_markers_with_placeholder() {
    let dir = tempdir().unwrap();
    let input = write_file(
        &dir,
        "sample.txt",
        "# 23andMe\nrsid\tchromosome\tposition\tgenotype\nrs1\t1\t100\tAG\nrs99\t1\t200\tTT\n",
    )
    .unwrap();
    let panel = write_file(&dir, "panel.snp", PANEL_SNP).unwrap();
    let output = dir.path().join("aligned.txt");

    let summary = align_file(&align_config(
        input,
        SampleFormat::TwentyThreeAndMe,
        panel,
        output.clone(),
        OutputFormat::TwentyThreeAndMe,
        false,
    ))
    .expect("align");

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "# rsid\tchromosome\tposition\tgenotype\nrs1\tchrom1\tpos1\tAG\nrs2\tchrom2\tpos2\t--\n"
    );
    assert_eq!(summary.sample_records, 2);
    assert_eq!(summary.statistics.total, 2);
    assert_eq!(summary.statistics.matched, 1);
    assert_eq!(summary.statistics.missing(), 1);
    assert_eq!(summary.statistics.matched_percent(), Some(50.0));
}

#[test]
fn align_with_flip_complements_opposite_strand() {
    let dir = tempdir().unwrap();
    let input = write_file(
        &dir,
        "sample.txt",
        "rsid\tchromosome\tposition\tallele1\tallele2\nrs1\t1\t100\tC\tC\n",
    )
    .unwrap();
    let panel = write_file(&dir, "panel.bim", "chrom1 rs1 0 pos1 G G\n").unwrap();
    let output = dir.path().join("aligned.txt");

    let summary = align_file(&align_config(
        input,
        SampleFormat::Ancestry,
        panel,
        output.clone(),
        OutputFormat::Ancestry,
        true,
    ))
    .expect("align");

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "# rsid\tchromosome\tposition\tallele1\tallele2\nrs1\tchrom1\tpos1\tG\tG\n"
    );
    assert_eq!(summary.statistics.complemented, 1);
}

#[test]
fn align_reports_skipped_panel_lines() {
    let dir = tempdir().unwrap();
    let input = write_file(&dir, "sample.csv", "RSID,CHROMOSOME,POSITION,RESULT\nrs1,1,5,AA\n").unwrap();
    let panel = write_file(
        &dir,
        "panel.bim",
        "1 rs1 0 5 A G\n1 rs2 x 6 A G\n1 rs3 0 7\n1 rs4 0 8 T C\n",
    )
    .unwrap();
    let output = dir.path().join("aligned.csv");

    let summary = align_file(&align_config(
        input,
        SampleFormat::FtdnaV2,
        panel,
        output.clone(),
        OutputFormat::FtdnaV1,
        false,
    ))
    .expect("align");

    assert_eq!(summary.panel_skipped_lines, 2);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "RSID,CHROMOSOME,POSITION,RESULT\n\"rs1\",\"1\",\"5\",\"AA\"\n\"rs4\",\"1\",\"8\",\"--\"\n"
    );
}

#[test]
fn align_tolerates_latin1_bytes_in_sample() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.txt");
    fs::write(
        &input,
        b"# Genotyp\xe9 export\nrs1\t1\t100\tAG\nrs\xe92\t1\t200\tCC\n",
    )
    .unwrap();
    let panel = write_file(&dir, "panel.snp", "rs1 chrom1 1e-2 pos1 A G\n").unwrap();
    let output = dir.path().join("aligned.txt");

    let summary = align_file(&align_config(
        input,
        SampleFormat::TwentyThreeAndMe,
        panel,
        output.clone(),
        OutputFormat::TwentyThreeAndMe,
        false,
    ))
    .expect("align");

    assert_eq!(summary.sample_records, 1);
    assert_eq!(summary.sample_skipped_lines, 1);
    assert_eq!(summary.statistics.matched, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "# rsid\tchromosome\tposition\tgenotype\nrs1\tchrom1\tpos1\tAG\n"
    );
}

#[test]
fn unsupported_panel_extension_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = write_file(&dir, "sample.txt", "rs1\t1\t100\tAG\n").unwrap();
    let panel = write_file(&dir, "panel.vcf", PANEL_SNP).unwrap();
    let output = dir.path().join("aligned.txt");

    let err = align_file(&align_config(
        input,
        SampleFormat::TwentyThreeAndMe,
        panel,
        output.clone(),
        OutputFormat::TwentyThreeAndMe,
        false,
    ))
    .unwrap_err();

    assert!(format!("{err:#}").contains("unsupported panel file extension"));
    assert!(!output.exists());
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempdir().unwrap();
    let panel = write_file(&dir, "panel.snp", PANEL_SNP).unwrap();

    let err = align_file(&align_config(
        dir.path().join("does_not_exist.txt"),
        SampleFormat::TwentyThreeAndMe,
        panel,
        dir.path().join("aligned.txt"),
        OutputFormat::TwentyThreeAndMe,
        false,
    ))
    .unwrap_err();

    assert!(format!("{err:#}").contains("failed to open input"));
    assert!(err.root_cause().downcast_ref::<io::Error>().is_some());
}

#[test]
fn convert_round_trips_through_ancestry() {
    let dir = tempdir().unwrap();
    let original = "rs1\t1\t100\tAG\nrs2\tX\t200\t--\nbad\nrs3\tMT\t300\tCC\n";
    let input = write_file(&dir, "sample.txt", original).unwrap();
    let ancestry = dir.path().join("ancestry.txt");
    let back = dir.path().join("back.txt");

    let first = convert_file(&ConversionConfig {
        input,
        input_format: SampleFormat::TwentyThreeAndMe,
        output: ancestry.clone(),
        output_format: OutputFormat::Ancestry,
    })
    .expect("convert to ancestry");
    assert_eq!(first.records, 3);
    assert_eq!(first.skipped_lines, 1);

    let second = convert_file(&ConversionConfig {
        input: ancestry,
        input_format: SampleFormat::Ancestry,
        output: back.clone(),
        output_format: OutputFormat::TwentyThreeAndMe,
    })
    .expect("convert back");
    assert_eq!(second.records, 3);
    assert_eq!(second.skipped_lines, 0);

    assert_eq!(
        fs::read_to_string(&back).unwrap(),
        "# rsid\tchromosome\tposition\tgenotype\nrs1\t1\t100\tAG\nrs2\tX\t200\t--\nrs3\tMT\t300\tCC\n"
    );
}

#[test]
fn convert_round_trips_through_quoted_csv() {
    let dir = tempdir().unwrap();
    let input = write_file(
        &dir,
        "sample.csv",
        "RSID,CHROMOSOME,POSITION,RESULT\nrs1,1,100,AG\nrs2,2,200,TT\n",
    )
    .unwrap();
    let quoted = dir.path().join("quoted.csv");
    let back = dir.path().join("back.csv");

    convert_file(&ConversionConfig {
        input,
        input_format: SampleFormat::FtdnaV2,
        output: quoted.clone(),
        output_format: OutputFormat::FtdnaV1,
    })
    .unwrap();
    convert_file(&ConversionConfig {
        input: quoted,
        input_format: SampleFormat::FtdnaV1,
        output: back.clone(),
        output_format: OutputFormat::FtdnaV2,
    })
    .unwrap();

    assert_eq!(
        fs::read_to_string(&back).unwrap(),
        "RSID,CHROMOSOME,POSITION,RESULT\nrs1,1,100,AG\nrs2,2,200,TT\n"
    );
}
