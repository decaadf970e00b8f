//! Request-scoped analysis context
//!
//! Holds the analysis configuration and memoizes finished analyses of the
//! exact input bytes, so re-running an unchanged upload is free. Entries are
//! looked up by hash and confirmed by comparing the bytes; the oldest entry
//! is evicted once the cache is full.

use crate::adapters::AdapterDetector;
use crate::error::Result;
use crate::quality::QualityAnalyzer;
use crate::reader::Compression;
use crate::reporting::FastqAnalysis;
use ahash::{AHashMap, AHasher};
use log::debug;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Analyses kept by [`AnalysisContext::default`]
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Cache key: content hash plus everything else the result depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContentKey {
    hash: u64,
    len: usize,
    compression: Compression,
}

impl ContentKey {
    fn new(data: &[u8], compression: Compression) -> Self {
        let mut hasher = AHasher::default();
        data.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            len: data.len(),
            compression,
        }
    }
}

struct CacheEntry {
    data: Vec<u8>,
    analysis: Arc<FastqAnalysis>,
}

pub struct AnalysisContext {
    analyzer: QualityAnalyzer,
    detector: AdapterDetector,
    capacity: usize,
    cache: AHashMap<ContentKey, CacheEntry>,
    // insertion order, oldest first
    order: VecDeque<ContentKey>,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new(QualityAnalyzer::default(), AdapterDetector::default())
    }
}

impl AnalysisContext {
    pub fn new(analyzer: QualityAnalyzer, detector: AdapterDetector) -> Self {
        Self::with_capacity(analyzer, detector, DEFAULT_CACHE_CAPACITY)
    }

    /// Context keeping at most `capacity` analyses; 0 disables caching
    pub fn with_capacity(analyzer: QualityAnalyzer, detector: AdapterDetector, capacity: usize) -> Self {
        Self {
            analyzer,
            detector,
            capacity,
            cache: AHashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn analyzer(&self) -> QualityAnalyzer {
        self.analyzer
    }

    pub fn detector(&self) -> &AdapterDetector {
        &self.detector
    }

    /// Analyze an upload, reusing the earlier result for identical bytes.
    /// Failed analyses are not cached.
    pub fn analyze(&mut self, data: &[u8], compression: Compression) -> Result<Arc<FastqAnalysis>> {
        let key = ContentKey::new(data, compression);
        match self.cache.get(&key) {
            Some(entry) if entry.data == data => {
                debug!("cache hit for {} byte input", data.len());
                return Ok(Arc::clone(&entry.analysis));
            }
            Some(_) => debug!("hash collision for {} byte input", data.len()),
            None => {}
        }

        let stats = self.analyzer.analyze_bytes(data, compression)?;
        let analysis = Arc::new(FastqAnalysis::new(stats, &self.detector));
        self.insert(key, data, Arc::clone(&analysis));
        Ok(analysis)
    }

    fn insert(&mut self, key: ContentKey, data: &[u8], analysis: Arc<FastqAnalysis>) {
        if self.capacity == 0 {
            return;
        }
        let entry = CacheEntry {
            data: data.to_vec(),
            analysis,
        };
        if self.cache.insert(key, entry).is_some() {
            // replaced a colliding entry, which keeps its place in the order
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
    }

    /// Number of cached analyses
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.order.clear();
    }
}
