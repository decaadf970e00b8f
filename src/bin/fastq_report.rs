//! Seq QC FASTQ Report Tool
//!
//! Quality report for a FASTQ or FASTQ.GZ file: read lengths, per-position
//! quality, ambiguous bases, nucleotide frequencies, adapters and duplicates.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use env_logger::Env;
use log::info;
use seq_qc_tools::adapters::AdapterDetector;
use seq_qc_tools::quality::{QualityAnalyzer, DEFAULT_MAX_POSITIONS};
use seq_qc_tools::reporting::{FastqAnalysis, QcReporter, DEFAULT_QUALITY_THRESHOLD};
use seq_qc_tools::sampler::DEFAULT_MAX_RECORDS;
use seq_qc_tools::{get_file_info, sample_name, Compression};
use std::fs::File;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = Command::new("seq-qc-fastq-report")
        .version("0.1.0")
        .about("Quality report for FASTQ files (plain or gzip)")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FASTQ")
                .help("Input FASTQ file (.fastq, .fq, .fastq.gz, .fq.gz)")
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("JSON")
                .help("Output JSON report")
                .value_parser(value_parser!(PathBuf))
                .default_value("fastq_report.json"),
        )
        .arg(
            Arg::new("max_reads")
                .short('n')
                .long("max-reads")
                .value_name("COUNT")
                .help("Number of reads to analyse; the rest of the file is not read")
                .value_parser(value_parser!(usize))
                .default_value("10000"),
        )
        .arg(
            Arg::new("max_positions")
                .long("max-positions")
                .value_name("POSITIONS")
                .help("Read positions tracked for nucleotide frequencies")
                .value_parser(value_parser!(usize))
                .default_value("150"),
        )
        .arg(
            Arg::new("adapter")
                .short('a')
                .long("adapter")
                .value_name("SEQUENCE")
                .help("Adapter to search for; repeat to give several (default: TruSeq and Nextera)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("compression")
                .short('c')
                .long("compression")
                .value_name("FORMAT")
                .help("Input compression: auto (from file name), none or gzip")
                .default_value("auto"),
        )
        .arg(
            Arg::new("quality_threshold")
                .short('q')
                .long("quality-threshold")
                .value_name("PHRED")
                .help("Mean Phred score a sample must reach")
                .value_parser(value_parser!(f64))
                .default_value("20"),
        )
        .get_matches();

    let input_file = matches
        .get_one::<PathBuf>("input")
        .context("--input is required")?
        .clone();
    let output_file = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("fastq_report.json"));
    let max_records = matches
        .get_one::<usize>("max_reads")
        .copied()
        .unwrap_or(DEFAULT_MAX_RECORDS);
    let max_positions = matches
        .get_one::<usize>("max_positions")
        .copied()
        .unwrap_or(DEFAULT_MAX_POSITIONS);
    let quality_threshold = matches
        .get_one::<f64>("quality_threshold")
        .copied()
        .unwrap_or(DEFAULT_QUALITY_THRESHOLD);
    let detector = match matches.get_many::<String>("adapter") {
        Some(adapters) => AdapterDetector::new(adapters.cloned()),
        None => AdapterDetector::default(),
    };
    let compression = match matches.get_one::<String>("compression").map(String::as_str) {
        None | Some("auto") => Compression::from_path(&input_file),
        Some(name) => Compression::from_name(name)?,
    };

    if !input_file.exists() {
        anyhow::bail!("Input file does not exist: {}", input_file.display());
    }

    let (file_name, file_size) = get_file_info(&input_file)?;
    println!("🧬 Seq QC FASTQ Report");
    println!("Input: {} ({} bytes, {:?})", file_name, file_size, compression);
    println!("Output: {}", output_file.display());
    println!("Max reads: {}, Max positions: {}", max_records, max_positions);

    let analyzer = QualityAnalyzer::new(max_records, max_positions);

    info!("analyzing {}", input_file.display());
    let file = File::open(&input_file)
        .with_context(|| format!("failed to open {}", input_file.display()))?;
    let stats = analyzer
        .analyze_reader(file, compression)
        .with_context(|| format!("failed to analyze {}", input_file.display()))?;
    let analysis = FastqAnalysis::new(stats, &detector);

    let report = analysis.report(&sample_name(&input_file), analyzer);
    let reporter = QcReporter::new(quality_threshold);
    reporter.export_json(&report, &output_file)?;

    let summary = &report.summary;
    println!("✅ Quality analysis complete!");
    println!("📈 Sample: {}", report.sample_name);
    println!("📚 Total reads: {}", summary.total_reads);
    println!("📏 Mean length: {:.1} bp ({}-{} bp)", summary.mean_length, summary.min_length, summary.max_length);
    println!("⭐ Mean quality: {:.1}", summary.mean_quality);
    println!("🎯 Q20 bases: {:.2}%, Q30 bases: {:.2}%", summary.q20_bases_pct, summary.q30_bases_pct);
    println!("❓ Mean N per read: {:.2} ({:.2}% of reads with N)", summary.mean_ambiguous, summary.reads_with_ambiguous_pct);
    println!("🔁 Duplicate reads: {:.2}%", report.duplicates.duplicate_percentage);
    for hit in &report.adapters.adapters {
        println!("🔗 Adapter {}: {:.2}%", hit.adapter, hit.percentage);
    }

    let low_positions = reporter.low_quality_positions(summary);
    if !low_positions.is_empty() {
        println!("⚠️  {} positions below Phred {}", low_positions.len(), quality_threshold);
    }
    if reporter.evaluate(summary) {
        println!("✅ Mean quality passes Phred {}", quality_threshold);
    } else {
        println!("❌ Mean quality below Phred {}", quality_threshold);
    }
    println!("💾 Report saved to: {}", output_file.display());

    Ok(())
}
