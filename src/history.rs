//! Rolling window of recent location samples.

use std::collections::VecDeque;

use crate::GpsPoint;

/// Bounded FIFO of location samples, oldest first.
///
/// Once full, each push evicts the oldest sample. The window is only held in
/// memory; persisting raw location history is left to the host.
#[derive(Debug, Clone)]
pub struct LocationHistory {
    samples: VecDeque<GpsPoint>,
    capacity: usize,
}

impl LocationHistory {
    /// Create an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn push(&mut self, sample: GpsPoint) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Change the capacity, dropping the oldest samples if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// The window as one contiguous slice, oldest first.
    pub fn window(&mut self) -> &[GpsPoint] {
        self.samples.make_contiguous()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&GpsPoint> {
        self.samples.back()
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

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
