//! Scratch buffer reuse for the write path
//!
//! Buffers are grouped into power-of-two size classes. Each class keeps at
//! most `max_per_class` idle buffers; extra releases are dropped.

use std::collections::HashMap;

/// Smallest size class handed out
pub const MIN_CLASS: usize = 4 * 1024;

/// Default number of idle buffers kept per class
pub const DEFAULT_MAX_PER_CLASS: usize = 8;

/// Buffer pool statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Acquisitions served from an idle buffer
    pub hits: u64,
    /// Acquisitions that allocated
    pub misses: u64,
    /// Releases dropped because their class was full
    pub dropped: u64,
    /// Idle buffers currently held
    pub idle: usize,
}

impl BufferPoolStats {
    /// Fraction of acquisitions served from the pool
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct BufferPool {
    classes: HashMap<usize, Vec<Vec<u8>>>,
    max_per_class: usize,
    stats: BufferPoolStats,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_CLASS)
    }
}

impl BufferPool {
    #[must_use]
    pub fn new(max_per_class: usize) -> Self {
        Self {
            classes: HashMap::new(),
            max_per_class,
            stats: BufferPoolStats::default(),
        }
    }

    /// Size class a request of `len` bytes is served from
    #[must_use]
    pub fn class_for(len: usize) -> usize {
        len.max(MIN_CLASS).next_power_of_two()
    }

    /// An empty buffer with capacity for at least `len` bytes
    pub fn acquire(&mut self, len: usize) -> Vec<u8> {
        let class = Self::class_for(len);
        if let Some(mut buffer) = self.classes.get_mut(&class).and_then(Vec::pop) {
            buffer.clear();
            self.stats.hits += 1;
            self.stats.idle -= 1;
            return buffer;
        }
        self.stats.misses += 1;
        Vec::with_capacity(class)
    }

    /// Return a buffer to its class
    pub fn release(&mut self, buffer: Vec<u8>) {
        let capacity = buffer.capacity();
        // Only exact classes are pooled so acquire can trust the capacity.
        if capacity < MIN_CLASS || !capacity.is_power_of_two() {
            self.stats.dropped += 1;
            return;
        }
        let idle = self.classes.entry(capacity).or_default();
        if idle.len() >= self.max_per_class {
            self.stats.dropped += 1;
            return;
        }
        idle.push(buffer);
        self.stats.idle += 1;
    }

    #[must_use]
    pub fn stats(&self) -> BufferPoolStats {
        self.stats
    }

    /// Drop every idle buffer
    pub fn clear(&mut self) {
        self.classes.clear();
        self.stats.idle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_rounding() {
        assert_eq!(BufferPool::class_for(1), MIN_CLASS);
        assert_eq!(BufferPool::class_for(MIN_CLASS + 1), MIN_CLASS * 2);
        assert_eq!(BufferPool::class_for(1 << 20), 1 << 20);
    }

    #[test]
    fn test_reuse_counts_hits() {
        let mut pool = BufferPool::default();
        let mut buffer = pool.acquire(5000);
        assert_eq!(buffer.capacity(), 8192);
        buffer.extend_from_slice(b"data");
        pool.release(buffer);

        let again = pool.acquire(6000);
        assert!(again.is_empty());
        assert_eq!(again.capacity(), 8192);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_class_is_bounded() {
        let mut pool = BufferPool::new(2);
        let buffers: Vec<_> = (0..3).map(|_| pool.acquire(100)).collect();
        for buffer in buffers {
            pool.release(buffer);
        }
        let stats = pool.stats();
        assert_eq!(stats.idle, 2);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_odd_capacity_not_pooled() {
        let mut pool = BufferPool::default();
        pool.release(Vec::with_capacity(5000));
        assert_eq!(pool.stats().idle, 0);
    }
}
