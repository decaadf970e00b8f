//! Per-read metrics and corpus aggregation
//!
//! A single pass over the sampled reads produces everything the report
//! needs:
//! - read lengths and per-read Phred scores
//! - ambiguous (`N`) base counts
//! - a position-indexed nucleotide table, truncated at `max_positions`
//! - the raw sequences, kept for adapter and duplicate detection

use crate::error::Result;
use crate::reader::{Compression, FastqRecord, FastqStream};
use crate::sampler::{BoundedSampler, DEFAULT_MAX_RECORDS};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Number of read positions tracked by the nucleotide table
pub const DEFAULT_MAX_POSITIONS: usize = 150;

/// Ambiguous base symbol
pub const AMBIGUOUS_BASE: u8 = b'N';

/// Scalars extracted from one read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadMetrics {
    pub length: usize,
    pub ambiguous_count: usize,
}

/// Count of each symbol at each read position.
///
/// Rows are created the first time a symbol is seen and always hold
/// exactly `max_positions` counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NucleotideTable {
    max_positions: usize,
    counts: BTreeMap<char, Vec<u64>>,
}

impl NucleotideTable {
    pub fn new(max_positions: usize) -> Self {
        Self {
            max_positions,
            counts: BTreeMap::new(),
        }
    }

    pub fn max_positions(&self) -> usize {
        self.max_positions
    }

    /// Add one read. Bases at or beyond `max_positions` are ignored.
    pub fn record(&mut self, sequence: &[u8]) {
        let max_positions = self.max_positions;
        for (pos, &base) in sequence.iter().take(max_positions).enumerate() {
            self.counts
                .entry(base as char)
                .or_insert_with(|| vec![0; max_positions])[pos] += 1;
        }
    }

    /// Reads with `symbol` at `position`; 0 for unseen symbols or
    /// positions outside the table
    pub fn count(&self, symbol: u8, position: usize) -> u64 {
        self.counts
            .get(&(symbol as char))
            .and_then(|row| row.get(position))
            .copied()
            .unwrap_or(0)
    }

    /// Full row for `symbol`, if it was ever seen
    pub fn counts(&self, symbol: u8) -> Option<&[u64]> {
        self.counts.get(&(symbol as char)).map(Vec::as_slice)
    }

    /// Symbols seen, in ascending order
    pub fn symbols(&self) -> impl Iterator<Item = u8> + '_ {
        self.counts.keys().map(|&c| c as u8)
    }

    /// Reads covering `position`, summed over all symbols
    pub fn coverage(&self, position: usize) -> u64 {
        self.counts
            .values()
            .filter_map(|row| row.get(position))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Compute the per-read scalars and add the read to `table`
pub fn extract_metrics(record: &FastqRecord, table: &mut NucleotideTable) -> ReadMetrics {
    table.record(&record.sequence);

    ReadMetrics {
        length: record.sequence.len(),
        ambiguous_count: record
            .sequence
            .iter()
            .filter(|&&b| b == AMBIGUOUS_BASE)
            .count(),
    }
}

/// Aggregated statistics for one input.
///
/// All vectors are in input order and share the same length,
/// `total_reads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_reads: usize,
    pub lengths: Vec<usize>,
    pub qualities: Vec<Vec<u8>>,
    pub ambiguous_counts: Vec<usize>,
    pub sequences: Vec<Vec<u8>>,
    pub nucleotide_table: NucleotideTable,
}

impl CorpusStats {
    pub fn is_empty(&self) -> bool {
        self.total_reads == 0
    }
}

/// Accumulates records into a [`CorpusStats`]
pub struct CorpusStatsBuilder {
    lengths: Vec<usize>,
    qualities: Vec<Vec<u8>>,
    ambiguous_counts: Vec<usize>,
    sequences: Vec<Vec<u8>>,
    table: NucleotideTable,
}

impl CorpusStatsBuilder {
    pub fn new(max_positions: usize) -> Self {
        Self {
            lengths: Vec::new(),
            qualities: Vec::new(),
            ambiguous_counts: Vec::new(),
            sequences: Vec::new(),
            table: NucleotideTable::new(max_positions),
        }
    }

    pub fn push(&mut self, record: FastqRecord) {
        let metrics = extract_metrics(&record, &mut self.table);
        self.lengths.push(metrics.length);
        self.ambiguous_counts.push(metrics.ambiguous_count);
        self.qualities.push(record.quality);
        self.sequences.push(record.sequence);
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn finish(self) -> CorpusStats {
        CorpusStats {
            total_reads: self.lengths.len(),
            lengths: self.lengths,
            qualities: self.qualities,
            ambiguous_counts: self.ambiguous_counts,
            sequences: self.sequences,
            nucleotide_table: self.table,
        }
    }
}

/// FASTQ quality analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAnalyzer {
    /// Reads analysed per input; the rest of the input is not read
    pub max_records: usize,
    /// Read positions tracked by the nucleotide table
    pub max_positions: usize,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            max_positions: DEFAULT_MAX_POSITIONS,
        }
    }
}

impl QualityAnalyzer {
    pub fn new(max_records: usize, max_positions: usize) -> Self {
        Self {
            max_records,
            max_positions,
        }
    }

    /// Aggregate a record stream. The first error aborts the analysis and
    /// no partial statistics are returned.
    pub fn analyze_records<I>(&self, records: I) -> Result<CorpusStats>
    where
        I: IntoIterator<Item = Result<FastqRecord>>,
    {
        let mut builder = CorpusStatsBuilder::new(self.max_positions);
        let mut sampler = BoundedSampler::new(records.into_iter(), self.max_records);

        for record in sampler.by_ref() {
            builder.push(record?);
        }

        let stats = builder.finish();
        info!(
            "aggregated {} reads{}",
            stats.total_reads,
            if sampler.hit_ceiling() {
                " (sampling ceiling reached)"
            } else {
                ""
            }
        );
        Ok(stats)
    }

    /// Analyze a plain or gzip-compressed FASTQ byte stream
    pub fn analyze_reader<R: Read + Send>(&self, reader: R, compression: Compression) -> Result<CorpusStats> {
        let stream = FastqStream::new(reader, compression)?;
        self.analyze_records(stream)
    }

    /// Analyze an in-memory FASTQ upload
    pub fn analyze_bytes(&self, data: &[u8], compression: Compression) -> Result<CorpusStats> {
        debug!("analyzing {} bytes ({:?})", data.len(), compression);
        self.analyze_reader(data, compression)
    }

    /// Analyze a FASTQ file, inferring compression from its name
    pub fn analyze_fastq<P: AsRef<Path>>(&self, fastq_path: P) -> Result<CorpusStats> {
        let stream = FastqStream::from_path(fastq_path)?;
        self.analyze_records(stream)
    }
}
