//! Seq QC Tools
//!
//! Small analysis tools for DNA sequence data.
//!
//! This library provides:
//! - GC content of free text or marker-delimited multi-record files
//! - Streaming FASTQ reading (plain or gzip) with a bounded record sampler
//! - Per-read metrics aggregated into corpus statistics
//! - Adapter and exact-duplicate detection
//! - JSON quality reports

pub mod adapters;
pub mod context;
pub mod duplicates;
pub mod error;
pub mod gc;
pub mod quality;
pub mod reader;
pub mod reporting;
pub mod sampler;

pub use error::{QcError, Result};
pub use reader::{Compression, FastqRecord, FastqStream};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for QC statistics structures
pub trait QcStatsMarker: Clone + Serialize + for<'de> Deserialize<'de> + std::fmt::Debug {}

impl<T: QcStatsMarker> QcStatsMarker for Vec<T> {}

/// Sample name for an input file: its name without FASTQ/FASTA and
/// compression extensions (`run1.fastq.gz` -> `run1`)
pub fn sample_name<P: AsRef<Path>>(path: P) -> String {
    let name = path
        .as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let mut stem = name;
    for suffix in [".gz", ".fastq", ".fq", ".fasta", ".fa", ".txt"] {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            if !stripped.is_empty() {
                stem = stripped;
            }
        }
    }
    stem.to_string()
}

/// Read a file's name and size in bytes
pub fn get_file_info<P: AsRef<Path>>(path: P) -> anyhow::Result<(String, u64)> {
    let filename = path
        .as_ref()
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let metadata = std::fs::metadata(&path)?;
    Ok((filename, metadata.len()))
}
