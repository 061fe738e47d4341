//! Bounded price window. Oldest sample is evicted on overflow.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct PriceWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl PriceWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once capacity is exceeded.
    pub fn push(&mut self, price: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// The most recent `n` samples in insertion order, or `None` if fewer exist.
    pub fn tail(&self, n: usize) -> Option<impl Iterator<Item = f64> + '_> {
        if n == 0 || self.samples.len() < n {
            return None;
        }
        Some(self.samples.iter().skip(self.samples.len() - n).copied())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
