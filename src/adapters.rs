//! Adapter detection
//!
//! Reports, for each known adapter, the share of reads containing it as an
//! exact, case-sensitive substring. Finders are built once per adapter and
//! reused across reads (`memchr::memmem`).

use crate::QcStatsMarker;
use log::debug;
use memchr::memmem::Finder;
use serde::{Deserialize, Serialize};

/// Illumina TruSeq adapter prefix
pub const TRUSEQ_ADAPTER: &str = "AGATCGGAAGAG";
/// Nextera transposase adapter prefix
pub const NEXTERA_ADAPTER: &str = "CTGTCTCTTATA";

/// Detection result for one adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterHit {
    pub adapter: String,
    pub reads_with_adapter: usize,
    /// Share of reads containing the adapter, 0 to 100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdapterReport {
    pub total_reads: usize,
    /// One entry per adapter, in the detector's order
    pub adapters: Vec<AdapterHit>,
}

impl QcStatsMarker for AdapterReport {}

impl AdapterReport {
    /// Percentage for `adapter`, if it was searched for
    pub fn percentage(&self, adapter: &str) -> Option<f64> {
        self.adapters
            .iter()
            .find(|hit| hit.adapter == adapter)
            .map(|hit| hit.percentage)
    }
}

/// Adapter detector over a fixed adapter set
#[derive(Debug, Clone)]
pub struct AdapterDetector {
    pub adapters: Vec<String>,
}

impl Default for AdapterDetector {
    fn default() -> Self {
        Self {
            adapters: vec![TRUSEQ_ADAPTER.to_string(), NEXTERA_ADAPTER.to_string()],
        }
    }
}

impl AdapterDetector {
    /// Create a detector for a custom adapter set
    pub fn new<S: Into<String>>(adapters: impl IntoIterator<Item = S>) -> Self {
        Self {
            adapters: adapters.into_iter().map(Into::into).collect(),
        }
    }

    /// Search every read for every adapter.
    ///
    /// With no reads every percentage is 0.0.
    pub fn detect<S: AsRef<[u8]>>(&self, sequences: &[S]) -> AdapterReport {
        let total_reads = sequences.len();

        let adapters = self
            .adapters
            .iter()
            .map(|adapter| {
                let finder = Finder::new(adapter.as_bytes());
                let reads_with_adapter = sequences
                    .iter()
                    .filter(|seq| finder.find(seq.as_ref()).is_some())
                    .count();

                let percentage = if total_reads > 0 {
                    (reads_with_adapter as f64 / total_reads as f64) * 100.0
                } else {
                    0.0
                };

                debug!(
                    "adapter {}: {} of {} reads",
                    adapter, reads_with_adapter, total_reads
                );

                AdapterHit {
                    adapter: adapter.clone(),
                    reads_with_adapter,
                    percentage,
                }
            })
            .collect();

        AdapterReport {
            total_reads,
            adapters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_detector_defaults() {
        let detector = AdapterDetector::default();
        assert_eq!(detector.adapters, vec!["AGATCGGAAGAG", "CTGTCTCTTATA"]);
        assert!(detector.adapters.iter().all(|a| a.len() == 12));
    }

    #[test]
    fn test_adapter_detector_custom() {
        let detector = AdapterDetector::new(["ACGT"]);
        assert_eq!(detector.adapters, vec!["ACGT"]);
    }

    #[test]
    fn test_detect_percentages() {
        let sequences = vec![
            b"TTTTAGATCGGAAGAGCCCC".to_vec(),
            b"AGATCGGAAGAG".to_vec(),
            b"CTGTCTCTTATAAGATCGGAAGAG".to_vec(),
            b"ACGTACGTACGT".to_vec(),
        ];
        let report = AdapterDetector::default().detect(&sequences);

        assert_eq!(report.total_reads, 4);
        assert_eq!(report.adapters[0].reads_with_adapter, 3);
        assert_eq!(report.percentage(TRUSEQ_ADAPTER), Some(75.0));
        assert_eq!(report.percentage(NEXTERA_ADAPTER), Some(25.0));
        assert_eq!(report.percentage("GGGG"), None);
    }

    #[test]
    fn test_detect_is_case_sensitive() {
        let sequences = vec!["agatcggaagag"];
        let report = AdapterDetector::default().detect(&sequences);
        assert_eq!(report.percentage(TRUSEQ_ADAPTER), Some(0.0));
    }

    #[test]
    fn test_read_counted_once_per_adapter() {
        let sequences = vec!["AGATCGGAAGAGAGATCGGAAGAG"];
        let report = AdapterDetector::default().detect(&sequences);
        assert_eq!(report.adapters[0].reads_with_adapter, 1);
        assert_eq!(report.percentage(TRUSEQ_ADAPTER), Some(100.0));
    }

    #[test]
    fn test_empty_corpus() {
        let sequences: Vec<Vec<u8>> = Vec::new();
        let report = AdapterDetector::default().detect(&sequences);

        assert_eq!(report.total_reads, 0);
        assert_eq!(report.adapters.len(), 2);
        assert!(report.adapters.iter().all(|hit| hit.percentage == 0.0));
    }
}
