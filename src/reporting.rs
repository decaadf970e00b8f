//! FASTQ quality reporting
//!
//! Turns corpus statistics into the summary figures and distributions a
//! report needs, and exports them as JSON.

use crate::adapters::{AdapterDetector, AdapterReport};
use crate::duplicates::{find_duplicates, DuplicateReport};
use crate::quality::{CorpusStats, NucleotideTable, QualityAnalyzer};
use crate::QcStatsMarker;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Phred score marking an acceptable base call
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 20.0;

/// Headline figures for one input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualitySummary {
    pub total_reads: usize,
    pub total_bases: u64,
    pub mean_length: f64,
    pub min_length: usize,
    pub max_length: usize,
    /// Mean over reads of each read's mean Phred score
    pub mean_quality: f64,
    /// Mean number of `N` bases per read
    pub mean_ambiguous: f64,
    /// Share of reads with at least one `N`, 0 to 100
    pub reads_with_ambiguous_pct: f64,
    pub q20_bases_pct: f64,
    pub q30_bases_pct: f64,
    /// Mean Phred score at each position, over reads long enough to cover it
    pub mean_quality_by_position: Vec<f64>,
}

impl QcStatsMarker for QualitySummary {}

fn mean_of(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        values.sum::<f64>() / count as f64
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

impl QualitySummary {
    pub fn from_corpus(stats: &CorpusStats) -> Self {
        let total_reads = stats.total_reads;
        if total_reads == 0 {
            return Self::default();
        }

        let total_bases: u64 = stats.lengths.iter().map(|&l| l as u64).sum();

        let read_mean_quality = |q: &Vec<u8>| {
            if q.is_empty() {
                0.0
            } else {
                q.iter().map(|&s| s as f64).sum::<f64>() / q.len() as f64
            }
        };

        let mut q20 = 0u64;
        let mut q30 = 0u64;
        for &score in stats.qualities.iter().flatten() {
            if score >= 20 {
                q20 += 1;
            }
            if score >= 30 {
                q30 += 1;
            }
        }

        let max_length = stats.lengths.iter().copied().max().unwrap_or(0);
        let mut position_sums = vec![0u64; max_length];
        let mut position_reads = vec![0u64; max_length];
        for qualities in &stats.qualities {
            for (pos, &score) in qualities.iter().enumerate() {
                position_sums[pos] += score as u64;
                position_reads[pos] += 1;
            }
        }

        Self {
            total_reads,
            total_bases,
            mean_length: total_bases as f64 / total_reads as f64,
            min_length: stats.lengths.iter().copied().min().unwrap_or(0),
            max_length,
            mean_quality: mean_of(stats.qualities.iter().map(read_mean_quality), total_reads),
            mean_ambiguous: mean_of(
                stats.ambiguous_counts.iter().map(|&n| n as f64),
                total_reads,
            ),
            reads_with_ambiguous_pct: percent(
                stats.ambiguous_counts.iter().filter(|&&n| n > 0).count() as u64,
                total_reads as u64,
            ),
            q20_bases_pct: percent(q20, total_bases),
            q30_bases_pct: percent(q30, total_bases),
            mean_quality_by_position: position_sums
                .iter()
                .zip(&position_reads)
                .map(|(&sum, &reads)| sum as f64 / reads as f64)
                .collect(),
        }
    }
}

/// Histogram of values, keyed by value
pub fn distribution(values: &[usize]) -> BTreeMap<usize, u64> {
    let mut histogram = BTreeMap::new();
    for &value in values {
        *histogram.entry(value).or_insert(0) += 1;
    }
    histogram
}

/// Corpus statistics together with the derived analytics
#[derive(Debug, Clone, PartialEq)]
pub struct FastqAnalysis {
    pub stats: CorpusStats,
    pub adapters: AdapterReport,
    pub duplicates: DuplicateReport,
}

impl FastqAnalysis {
    pub fn new(stats: CorpusStats, detector: &AdapterDetector) -> Self {
        let adapters = detector.detect(&stats.sequences);
        let duplicates = find_duplicates(&stats.sequences);
        Self {
            stats,
            adapters,
            duplicates,
        }
    }

    pub fn summary(&self) -> QualitySummary {
        QualitySummary::from_corpus(&self.stats)
    }

    /// Assemble the data a rendered report is built from
    pub fn report(&self, sample_name: &str, analyzer: QualityAnalyzer) -> FastqReport {
        FastqReport {
            sample_name: sample_name.to_string(),
            analyzer,
            summary: self.summary(),
            adapters: self.adapters.clone(),
            duplicates: self.duplicates.clone(),
            nucleotide_table: self.stats.nucleotide_table.clone(),
            length_distribution: distribution(&self.stats.lengths),
            ambiguous_distribution: distribution(&self.stats.ambiguous_counts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastqReport {
    pub sample_name: String,
    pub analyzer: QualityAnalyzer,
    pub summary: QualitySummary,
    pub adapters: AdapterReport,
    pub duplicates: DuplicateReport,
    pub nucleotide_table: NucleotideTable,
    pub length_distribution: BTreeMap<usize, u64>,
    pub ambiguous_distribution: BTreeMap<usize, u64>,
}

impl QcStatsMarker for FastqReport {}

/// Report writer and quality gate
pub struct QcReporter {
    pub quality_threshold: f64,
}

impl Default for QcReporter {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
        }
    }
}

impl QcReporter {
    pub fn new(quality_threshold: f64) -> Self {
        Self { quality_threshold }
    }

    /// Export any QC result to pretty-printed JSON
    pub fn export_json<T: QcStatsMarker, P: AsRef<Path>>(&self, report: &T, path: P) -> Result<()> {
        let json_content = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json_content)?;
        Ok(())
    }

    /// Whether the mean read quality reaches the threshold. An empty input
    /// never passes.
    pub fn evaluate(&self, summary: &QualitySummary) -> bool {
        summary.total_reads > 0 && summary.mean_quality >= self.quality_threshold
    }

    /// Positions whose mean quality falls below the threshold
    pub fn low_quality_positions(&self, summary: &QualitySummary) -> Vec<usize> {
        summary
            .mean_quality_by_position
            .iter()
            .enumerate()
            .filter(|(_, &q)| q < self.quality_threshold)
            .map(|(pos, _)| pos)
            .collect()
    }
}
