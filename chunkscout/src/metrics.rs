use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters for one scan run, shared between the coordinator and its workers
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Indexing
    lines_indexed: Arc<AtomicU64>,
    bytes_indexed: Arc<AtomicU64>,
    mmap_indexes: Arc<AtomicU64>,
    buffered_indexes: Arc<AtomicU64>,

    // Workers
    lines_scanned: Arc<AtomicU64>,
    bytes_scanned: Arc<AtomicU64>,
    workers_completed: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            lines_indexed: Arc::new(AtomicU64::new(0)),
            bytes_indexed: Arc::new(AtomicU64::new(0)),
            mmap_indexes: Arc::new(AtomicU64::new(0)),
            buffered_indexes: Arc::new(AtomicU64::new(0)),
            lines_scanned: Arc::new(AtomicU64::new(0)),
            bytes_scanned: Arc::new(AtomicU64::new(0)),
            workers_completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a finished line index
    pub fn record_index(&self, lines: u64, bytes: u64, mapped: bool) {
        self.lines_indexed.fetch_add(lines, Ordering::Relaxed);
        self.bytes_indexed.fetch_add(bytes, Ordering::Relaxed);
        if mapped {
            self.mmap_indexes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffered_indexes.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            "Indexed {} lines ({} bytes, {})",
            lines,
            bytes,
            if mapped { "mmap" } else { "buffered" }
        );
    }

    /// Records one worker's finished chunk
    pub fn record_chunk(&self, lines: u64, bytes: u64) {
        self.lines_scanned.fetch_add(lines, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        let done = self.workers_completed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Chunk scanned: {} lines, {} bytes ({} workers done)",
            lines, bytes, done
        );
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            lines_indexed: self.lines_indexed.load(Ordering::Relaxed),
            bytes_indexed: self.bytes_indexed.load(Ordering::Relaxed),
            mmap_indexes: self.mmap_indexes.load(Ordering::Relaxed),
            buffered_indexes: self.buffered_indexes.load(Ordering::Relaxed),
            lines_scanned: self.lines_scanned.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            workers_completed: self.workers_completed.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Lines indexed: {} ({} bytes)\n\
             Index strategy (mmap/buffered): {}/{}\n\
             Lines scanned: {} ({} bytes)\n\
             Workers completed: {}",
            stats.lines_indexed,
            stats.bytes_indexed,
            stats.mmap_indexes,
            stats.buffered_indexes,
            stats.lines_scanned,
            stats.bytes_scanned,
            stats.workers_completed
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines_indexed: u64,
    pub bytes_indexed: u64,
    pub mmap_indexes: u64,
    pub buffered_indexes: u64,
    pub lines_scanned: u64,
    pub bytes_scanned: u64,
    pub workers_completed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_tracking() {
        let metrics = ScanMetrics::new();

        metrics.record_index(10, 200, false);
        metrics.record_index(5, 50_000_000, true);

        let stats = metrics.get_stats();
        assert_eq!(stats.lines_indexed, 15);
        assert_eq!(stats.bytes_indexed, 50_000_200);
        assert_eq!(stats.buffered_indexes, 1);
        assert_eq!(stats.mmap_indexes, 1);
    }

    #[test]
    fn test_chunk_tracking_across_clones() {
        let metrics = ScanMetrics::new();
        let shared = metrics.clone();

        metrics.record_chunk(3, 30);
        shared.record_chunk(4, 40);

        let stats = metrics.get_stats();
        assert_eq!(stats.lines_scanned, 7);
        assert_eq!(stats.bytes_scanned, 70);
        assert_eq!(stats.workers_completed, 2);
        assert_eq!(stats, shared.get_stats());
    }
}
