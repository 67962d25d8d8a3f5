// Live statistics: transfer counts and the existence cache hit rate.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub platform_writes: u64,
    pub joined_requests: u64,
    pub failed_transfers: u64,
    pub bytes_written: u64,
    pub active_transfers: u32,
    pub existence_cache_hit_rate: f64,
}

pub struct StatsCollector {
    platform_writes: AtomicU64,
    joined_requests: AtomicU64,
    failed_transfers: AtomicU64,
    bytes_written: AtomicU64,
    active_transfers: AtomicU32,
    existence_lookups: AtomicU64,
    existence_hits: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            platform_writes: AtomicU64::new(0),
            joined_requests: AtomicU64::new(0),
            failed_transfers: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            active_transfers: AtomicU32::new(0),
            existence_lookups: AtomicU64::new(0),
            existence_hits: AtomicU64::new(0),
        }
    }

    pub fn record_write(&self, bytes: u64) {
        self.platform_writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_joined(&self) {
        self.joined_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed_transfers.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an existence lookup and whether it was answered from cache.
    pub fn record_lookup(&self, cache_hit: bool) {
        self.existence_lookups.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.existence_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_transfers(&self) {
        self.active_transfers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_transfers(&self) {
        self.active_transfers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let lookups = self.existence_lookups.load(Ordering::Relaxed);
        let hits = self.existence_hits.load(Ordering::Relaxed);
        let existence_cache_hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        StatsSnapshot {
            platform_writes: self.platform_writes.load(Ordering::Relaxed),
            joined_requests: self.joined_requests.load(Ordering::Relaxed),
            failed_transfers: self.failed_transfers.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            active_transfers: self.active_transfers.load(Ordering::Relaxed),
            existence_cache_hit_rate,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = StatsCollector::new();
        stats.record_write(1000);
        stats.record_write(500);
        stats.record_joined();

        stats.record_lookup(true);
        stats.record_lookup(false);
        stats.record_lookup(false);
        stats.record_lookup(false);

        stats.increment_transfers();
        stats.increment_transfers();
        stats.decrement_transfers();

        let snap = stats.snapshot();
        assert_eq!(snap.platform_writes, 2);
        assert_eq!(snap.bytes_written, 1500);
        assert_eq!(snap.joined_requests, 1);
        assert_eq!(snap.active_transfers, 1);
        assert!((snap.existence_cache_hit_rate - 0.25).abs() < f64::EPSILON);
    }
}
