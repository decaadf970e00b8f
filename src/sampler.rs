//! Bounded record sampling
//!
//! Caps how many records are pulled from a source. Once the cap is reached
//! the source is dropped, which closes the decoder and the underlying file,
//! so the rest of a large input is never read.

use log::{debug, warn};

/// Default number of records analysed per input
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

/// Iterator adaptor yielding at most `max_records` items from `source`.
///
/// The source is released as soon as the cap is hit, the source runs dry,
/// or the source yields an error.
pub struct BoundedSampler<I> {
    source: Option<I>,
    max_records: usize,
    sampled: usize,
    hit_ceiling: bool,
}

impl<I> BoundedSampler<I> {
    pub fn new(source: I, max_records: usize) -> Self {
        let mut sampler = Self {
            source: Some(source),
            max_records,
            sampled: 0,
            hit_ceiling: false,
        };
        if max_records == 0 {
            sampler.release(true);
        }
        sampler
    }

    /// Records yielded so far
    pub fn sampled(&self) -> usize {
        self.sampled
    }

    /// Whether reading stopped because the cap was reached. A source holding
    /// exactly `max_records` records also reports true, since it is never
    /// polled past the cap.
    pub fn hit_ceiling(&self) -> bool {
        self.hit_ceiling
    }

    /// Whether the source has been released
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }

    fn release(&mut self, at_ceiling: bool) {
        if self.source.take().is_some() {
            self.hit_ceiling = at_ceiling;
            if at_ceiling {
                warn!(
                    "sampling ceiling of {} records reached, ignoring the rest of the input",
                    self.max_records
                );
            } else {
                debug!("source released after {} records", self.sampled);
            }
        }
    }
}

impl<I, T, E> Iterator for BoundedSampler<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;

        match source.next() {
            Some(Ok(item)) => {
                self.sampled += 1;
                if self.sampled >= self.max_records {
                    self.release(true);
                }
                Some(Ok(item))
            }
            Some(Err(e)) => {
                self.release(false);
                Some(Err(e))
            }
            None => {
                self.release(false);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.source {
            Some(source) => {
                let remaining = self.max_records - self.sampled;
                let (low, high) = source.size_hint();
                (
                    low.min(remaining),
                    Some(high.map_or(remaining, |h| h.min(remaining))),
                )
            }
            None => (0, Some(0)),
        }
    }
}

impl<I, T, E> std::iter::FusedIterator for BoundedSampler<I> where
    I: Iterator<Item = Result<T, E>>
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Source that counts how often it is polled and flags when dropped
    struct Probe {
        remaining: usize,
        polled: Rc<Cell<usize>>,
        dropped: Rc<Cell<bool>>,
    }

    impl Iterator for Probe {
        type Item = Result<usize, String>;

        fn next(&mut self) -> Option<Self::Item> {
            self.polled.set(self.polled.get() + 1);
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            Some(Ok(self.remaining))
        }
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    fn probe(remaining: usize) -> (Probe, Rc<Cell<usize>>, Rc<Cell<bool>>) {
        let polled = Rc::new(Cell::new(0));
        let dropped = Rc::new(Cell::new(false));
        (
            Probe {
                remaining,
                polled: Rc::clone(&polled),
                dropped: Rc::clone(&dropped),
            },
            polled,
            dropped,
        )
    }

    #[test]
    fn test_default_ceiling() {
        assert_eq!(DEFAULT_MAX_RECORDS, 10_000);
    }

    #[test]
    fn test_stops_reading_at_ceiling() {
        let (source, polled, dropped) = probe(100);
        let mut sampler = BoundedSampler::new(source, 10);

        let items: Vec<_> = sampler.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(polled.get(), 10);
        assert!(dropped.get());
        assert!(sampler.hit_ceiling());
        assert!(sampler.next().is_none());
    }

    #[test]
    fn test_short_source_passes_through() {
        let (source, _, dropped) = probe(3);
        let mut sampler = BoundedSampler::new(source, 10);

        let items: Vec<_> = sampler.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(items, vec![2, 1, 0]);
        assert_eq!(sampler.sampled(), 3);
        assert!(!sampler.hit_ceiling());
        assert!(dropped.get());
    }

    #[test]
    fn test_exact_ceiling() {
        let (source, _, _) = probe(5);
        let mut sampler = BoundedSampler::new(source, 5);
        assert_eq!(sampler.by_ref().count(), 5);
        assert!(sampler.is_exhausted());
    }

    #[test]
    fn test_zero_ceiling_releases_immediately() {
        let (source, polled, dropped) = probe(5);
        let mut sampler = BoundedSampler::new(source, 0);
        assert!(dropped.get());
        assert!(sampler.next().is_none());
        assert_eq!(polled.get(), 0);
    }

    #[test]
    fn test_error_releases_source() {
        let source = vec![Ok(1), Err("bad record"), Ok(2)].into_iter();
        let mut sampler = BoundedSampler::new(source, 10);

        assert_eq!(sampler.next(), Some(Ok(1)));
        assert_eq!(sampler.next(), Some(Err("bad record")));
        assert!(sampler.is_exhausted());
        assert_eq!(sampler.next(), None);
    }
}
