use crossbeam_channel::{Receiver, Sender};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

use super::matcher::PatternMatcher;
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanMetrics;
use crate::results::{WorkAssignment, WorkerResult};

const BUFFER_CAPACITY: usize = 65536;

/// What a worker sends back over its result channel
pub type WorkerReport = SearchResult<WorkerResult>;

/// Applies `encoding_mode` to a chunk's bytes. Counting never needs decoded text,
/// so this only decides whether invalid UTF-8 is an error.
fn check_encoding(bytes: &[u8], path: &Path, encoding_mode: EncodingMode) -> SearchResult<()> {
    match encoding_mode {
        EncodingMode::Raw => Ok(()),
        EncodingMode::FailFast => std::str::from_utf8(bytes)
            .map(|_| ())
            .map_err(|e| SearchError::encoding_error(path, e)),
        EncodingMode::Lossy => {
            if std::str::from_utf8(bytes).is_err() {
                warn!("Invalid UTF-8 in file: {}", path.display());
            }
            Ok(())
        }
    }
}

/// The joined lines of one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Line contents with their `\n` terminators removed
    pub bytes: Vec<u8>,
    /// Lines actually read; fewer than requested if the file ended early
    pub lines_read: usize,
}

/// Reads `line_count` lines starting at `start_byte_offset` and joins them with
/// their line terminators removed. Reading stops early at end of file.
pub fn read_chunk(path: &Path, start_byte_offset: u64, line_count: usize) -> SearchResult<Chunk> {
    let mut chunk = Chunk::default();
    if line_count == 0 {
        return Ok(chunk);
    }

    let mut file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
    file.seek(SeekFrom::Start(start_byte_offset))
        .map_err(|e| SearchError::from_io(path, e))?;

    let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
    let mut line = Vec::with_capacity(256);

    for _ in 0..line_count {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SearchError::from_io(path, e))?;
        if read == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        chunk.bytes.extend_from_slice(&line);
        chunk.lines_read += 1;
    }

    Ok(chunk)
}

/// Counts `pattern` in the `line_count` lines starting at `start_byte_offset`
pub fn scan(
    path: &Path,
    pattern: &str,
    start_byte_offset: u64,
    line_count: usize,
) -> SearchResult<usize> {
    let matcher = PatternMatcher::new(pattern)?;
    ChunkScanner::new(matcher, EncodingMode::default()).scan_range(
        path,
        start_byte_offset,
        line_count,
    )
}

/// Scans line ranges of one file for one keyword
#[derive(Debug, Clone)]
pub struct ChunkScanner {
    matcher: PatternMatcher,
    encoding_mode: EncodingMode,
    metrics: ScanMetrics,
}

impl ChunkScanner {
    pub fn new(matcher: PatternMatcher, encoding_mode: EncodingMode) -> Self {
        Self::with_metrics(matcher, encoding_mode, ScanMetrics::new())
    }

    pub fn with_metrics(
        matcher: PatternMatcher,
        encoding_mode: EncodingMode,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            matcher,
            encoding_mode,
            metrics,
        }
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Counts matches in one line range
    pub fn scan_range(
        &self,
        path: &Path,
        start_byte_offset: u64,
        line_count: usize,
    ) -> SearchResult<usize> {
        trace!(
            "Scanning {} lines of {} from byte {}",
            line_count,
            path.display(),
            start_byte_offset
        );

        let chunk = read_chunk(path, start_byte_offset, line_count)?;
        if chunk.lines_read < line_count {
            debug!(
                "{} ended after {} of {} lines",
                path.display(),
                chunk.lines_read,
                line_count
            );
        }
        check_encoding(&chunk.bytes, path, self.encoding_mode)?;
        let count = self.matcher.count_matches(&chunk.bytes);

        self.metrics.record_chunk(chunk.lines_read as u64, chunk.bytes.len() as u64);
        Ok(count)
    }

    /// Runs a full assignment and tags the count with the worker index
    pub fn scan_assignment(&self, path: &Path, assignment: &WorkAssignment) -> WorkerReport {
        match assignment.last_line() {
            Some(last) => info!(
                "Worker {} spawned, scanning lines {} to {}",
                assignment.worker_index, assignment.first_line, last
            ),
            None => info!(
                "Worker {} spawned with no lines to scan",
                assignment.worker_index
            ),
        }

        let match_count =
            self.scan_range(path, assignment.start_byte_offset, assignment.line_count)?;
        Ok(WorkerResult {
            worker_index: assignment.worker_index,
            match_count,
        })
    }
}

/// One worker's end of its channel pair: waits for a single assignment, scans it,
/// and replies once. Returns quietly if the coordinator hangs up first.
pub fn run_worker(
    index: usize,
    path: PathBuf,
    scanner: ChunkScanner,
    assignments: Receiver<WorkAssignment>,
    reports: Sender<WorkerReport>,
) {
    let assignment = match assignments.recv() {
        Ok(assignment) => assignment,
        Err(_) => {
            warn!("Worker {} channel closed before an assignment arrived", index);
            return;
        }
    };

    let report = scanner.scan_assignment(&path, &assignment);
    if reports.send(report).is_err() {
        trace!("Worker {} result dropped, coordinator is gone", index);
    }
}
