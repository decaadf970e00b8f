//! Seq QC GC Content Tool
//!
//! GC content of a pasted sequence or of every record in a FASTA file

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgGroup, Command};
use env_logger::Env;
use log::{info, warn};
use seq_qc_tools::gc::{analyze_fasta, calculate_gc, display_id, filter_acgt, GcRecord};
use seq_qc_tools::reporting::QcReporter;
use std::path::PathBuf;

/// Characters of the cleaned sequence echoed back
const PREVIEW_LEN: usize = 500;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = Command::new("seq-qc-gc-content")
        .version("0.1.0")
        .about("GC content of DNA sequences")
        .arg(
            Arg::new("sequence")
                .short('s')
                .long("sequence")
                .value_name("DNA")
                .help("DNA sequence to analyse; characters other than ACGT are ignored"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FASTA")
                .help("FASTA file (.fasta, .fa, .txt)")
                .value_parser(value_parser!(PathBuf)),
        )
        .group(
            ArgGroup::new("source")
                .args(["sequence", "input"])
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("JSON")
                .help("Write results as JSON")
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches();

    let output_file = matches.get_one::<PathBuf>("output").cloned();

    let records: Vec<GcRecord> = if let Some(sequence) = matches.get_one::<String>("sequence") {
        if sequence.trim().is_empty() {
            anyhow::bail!("Please provide a DNA sequence");
        }
        let gc = calculate_gc(sequence);
        vec![GcRecord {
            id: "input sequence".to_string(),
            sequence_length: gc.length,
            gc,
        }]
    } else {
        let input_file = matches
            .get_one::<PathBuf>("input")
            .context("either --sequence or --input is required")?;
        if !input_file.exists() {
            anyhow::bail!("Input file does not exist: {}", input_file.display());
        }
        let content = std::fs::read_to_string(input_file)
            .with_context(|| format!("failed to read {}", input_file.display()))?;
        let records = analyze_fasta(&content);
        if records.is_empty() {
            anyhow::bail!("No valid sequences found in {}", input_file.display());
        }
        info!("analysed {} sequences", records.len());
        records
    };

    println!("🧬 Seq QC GC Content");
    println!(
        "{:<53} {:>8} {:>10} {:>8} {:>8} {:>8} {:>8}",
        "ID", "% GC", "Length", "G", "C", "A", "T"
    );
    for record in &records {
        let gc = &record.gc;
        println!(
            "{:<53} {:>7.2}% {:>10} {:>8} {:>8} {:>8} {:>8}",
            display_id(&record.id),
            gc.gc_percent,
            record.sequence_length,
            gc.g,
            gc.c,
            gc.a,
            gc.t
        );
        if gc.length == 0 {
            warn!("{} has no A, C, G or T bases", record.id);
        }
    }

    if let Some(sequence) = matches.get_one::<String>("sequence") {
        let gc = &records[0].gc;
        println!("🔬 GC bases: {}", gc.gc_bases());
        let cleaned = filter_acgt(sequence);
        let preview: String = cleaned.chars().take(PREVIEW_LEN).collect();
        let ellipsis = if cleaned.len() > PREVIEW_LEN { "..." } else { "" };
        println!("Processed sequence (ACGT only): {}{}", preview, ellipsis);
    } else {
        println!("✅ Analysed {} sequences", records.len());
    }

    if let Some(output_file) = output_file {
        QcReporter::default().export_json(&records, &output_file)?;
        println!("💾 Results saved to: {}", output_file.display());
    }

    Ok(())
}
