//! Exact duplicate read detection
//!
//! Counts full-sequence matches only; no k-mer or similarity clustering.

use crate::QcStatsMarker;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub total_reads: usize,
    pub distinct_sequences: usize,
    /// Distinct sequences seen more than once
    pub duplicated_sequences: usize,
    /// Reads whose sequence is seen more than once
    pub duplicate_reads: usize,
    /// `duplicated_sequences / total_reads * 100`.
    ///
    /// Counts each duplicated sequence once, however many copies it has:
    /// ten reads of which three are identical give 10%, not 30%.
    pub duplicate_percentage: f64,
}

impl QcStatsMarker for DuplicateReport {}

/// Tally exact sequence duplicates
pub fn find_duplicates<S: AsRef<[u8]>>(sequences: &[S]) -> DuplicateReport {
    let mut counter: AHashMap<&[u8], usize> = AHashMap::with_capacity(sequences.len());
    for seq in sequences {
        *counter.entry(seq.as_ref()).or_insert(0) += 1;
    }

    let total_reads = sequences.len();
    let (duplicated_sequences, duplicate_reads) = counter
        .values()
        .filter(|&&count| count > 1)
        .fold((0, 0), |(seqs, reads), &count| (seqs + 1, reads + count));

    let duplicate_percentage = if total_reads > 0 {
        (duplicated_sequences as f64 / total_reads as f64) * 100.0
    } else {
        0.0
    };

    DuplicateReport {
        total_reads,
        distinct_sequences: counter.len(),
        duplicated_sequences,
        duplicate_reads,
        duplicate_percentage,
    }
}

/// Duplicate percentage as defined on [`DuplicateReport`]
pub fn duplicate_percentage<S: AsRef<[u8]>>(sequences: &[S]) -> f64 {
    find_duplicates(sequences).duplicate_percentage
}
