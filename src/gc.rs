//! GC content calculator
//!
//! Works on free text: input is uppercased and every character other than
//! `A`, `C`, `G` or `T` is dropped before counting. Invalid characters are
//! filtered, never rejected.

use crate::QcStatsMarker;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Header marker of the multi-record text format
pub const HEADER_MARKER: char = '>';

/// Identifiers longer than this are shortened for display
pub const MAX_DISPLAY_ID: usize = 50;

/// Base composition of a filtered sequence
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GcResult {
    /// Number of A/C/G/T characters kept after filtering
    pub length: usize,
    pub a: usize,
    pub c: usize,
    pub g: usize,
    pub t: usize,
    /// `(g + c) / length * 100`, rounded to two decimals (ties to even); 0.0 when empty
    pub gc_percent: f64,
}

impl QcStatsMarker for GcResult {}

impl GcResult {
    pub fn gc_bases(&self) -> usize {
        self.g + self.c
    }
}

/// One record of a multi-record text file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastaEntry {
    pub id: String,
    pub sequence: String,
}

/// GC result for one record of a multi-record file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcRecord {
    pub id: String,
    /// Length of the record as written, before filtering
    pub sequence_length: usize,
    pub gc: GcResult,
}

impl QcStatsMarker for GcRecord {}

/// Round to two decimals, ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Uppercase `sequence` and keep only A, C, G and T
pub fn filter_acgt(sequence: &str) -> String {
    sequence
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| matches!(c, 'A' | 'C' | 'G' | 'T'))
        .collect()
}

/// Base counts and GC percentage of `sequence` after filtering
pub fn calculate_gc(sequence: &str) -> GcResult {
    let filtered = filter_acgt(sequence);
    let mut result = GcResult {
        length: filtered.len(),
        ..GcResult::default()
    };

    for c in filtered.bytes() {
        match c {
            b'A' => result.a += 1,
            b'C' => result.c += 1,
            b'G' => result.g += 1,
            _ => result.t += 1,
        }
    }

    if result.length > 0 {
        result.gc_percent = round2(result.gc_bases() as f64 / result.length as f64 * 100.0);
    }

    result
}

/// Split marker-delimited text into records.
///
/// A line starting with `>` opens a record whose id is the rest of that
/// line; the trimmed lines up to the next header form its sequence. Lines
/// before the first header, and records with an empty id, are discarded.
/// A repeated id keeps its first position but takes the later sequence.
pub fn parse_fasta(content: &str) -> Vec<FastaEntry> {
    let mut entries: Vec<FastaEntry> = Vec::new();
    let mut index: AHashMap<String, usize> = AHashMap::new();

    let mut current_id = String::new();
    let mut current_seq = String::new();

    let mut flush = |id: &mut String, seq: &mut String| {
        if id.is_empty() {
            seq.clear();
            return;
        }
        let id = std::mem::take(id);
        let sequence = std::mem::take(seq);
        match index.get(&id) {
            Some(&i) => entries[i].sequence = sequence,
            None => {
                index.insert(id.clone(), entries.len());
                entries.push(FastaEntry { id, sequence });
            }
        }
    };

    for line in content.lines() {
        if let Some(header) = line.strip_prefix(HEADER_MARKER) {
            flush(&mut current_id, &mut current_seq);
            current_id = header.trim().to_string();
        } else {
            current_seq.push_str(line.trim());
        }
    }
    flush(&mut current_id, &mut current_seq);

    entries
}

/// GC content of every record in marker-delimited text
pub fn analyze_fasta(content: &str) -> Vec<GcRecord> {
    parse_fasta(content)
        .into_iter()
        .map(|entry| GcRecord {
            sequence_length: entry.sequence.chars().count(),
            gc: calculate_gc(&entry.sequence),
            id: entry.id,
        })
        .collect()
}

/// Shorten long identifiers to 50 characters followed by `...`
pub fn display_id(id: &str) -> String {
    if id.chars().count() > MAX_DISPLAY_ID {
        let short: String = id.chars().take(MAX_DISPLAY_ID).collect();
        format!("{}...", short)
    } else {
        id.to_string()
    }
}
