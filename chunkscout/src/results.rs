//! Messages and results that flow through a scan run.
//!
//! Each type here is owned by exactly one party at a time: the coordinator builds a
//! `WorkAssignment` and moves it into a worker's channel, the worker moves its
//! `WorkerResult` back, and the reducer folds those into one `AggregateResult`.
//! Nothing is shared mutably, so none of these types need locks.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::metrics::ScanStats;
use crate::search::plan::PartitionPlan;

/// The contiguous line range one worker is responsible for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkAssignment {
    /// Position of the worker in the pool, 0-based
    pub worker_index: usize,
    /// Byte offset of the first line of the chunk
    pub start_byte_offset: u64,
    /// Number of lines to read from `start_byte_offset`
    pub line_count: usize,
    /// Line number of the first line of the chunk, 0-based
    pub first_line: usize,
}

impl WorkAssignment {
    /// Last line of the chunk, or `None` for an empty chunk
    pub fn last_line(&self) -> Option<usize> {
        (self.line_count > 0).then(|| self.first_line + self.line_count - 1)
    }
}

/// What one worker found in its chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerResult {
    pub worker_index: usize,
    pub match_count: usize,
}

/// The reduced outcome of all workers, in worker-index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    /// One entry per worker, sorted by `worker_index`
    pub per_worker: Vec<WorkerResult>,
    /// Sum of every `match_count`
    pub total_matches: usize,
}

impl AggregateResult {
    /// Writes one line per worker followed by the grand total
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for result in &self.per_worker {
            writeln!(
                out,
                "Worker {} found {} matches.",
                result.worker_index, result.match_count
            )?;
        }
        writeln!(out)?;
        writeln!(out, "Total occurrences: {}", self.total_matches)
    }
}

/// Everything a finished run reports
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub path: PathBuf,
    pub total_lines: usize,
    pub plan: PartitionPlan,
    pub aggregate: AggregateResult,
    pub stats: ScanStats,
}

impl ScanOutput {
    /// Total keyword occurrences across the file
    pub fn total_matches(&self) -> usize {
        self.aggregate.total_matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_last_line() {
        let assignment = WorkAssignment {
            worker_index: 1,
            start_byte_offset: 8,
            line_count: 3,
            first_line: 2,
        };
        assert_eq!(assignment.last_line(), Some(4));

        let empty = WorkAssignment {
            worker_index: 0,
            start_byte_offset: 0,
            line_count: 0,
            first_line: 0,
        };
        assert_eq!(empty.last_line(), None);
    }

    #[test]
    fn test_write_report() {
        let aggregate = AggregateResult {
            per_worker: vec![
                WorkerResult {
                    worker_index: 0,
                    match_count: 1,
                },
                WorkerResult {
                    worker_index: 1,
                    match_count: 2,
                },
            ],
            total_matches: 3,
        };

        let mut out = Vec::new();
        aggregate.write_report(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Worker 0 found 1 matches.\nWorker 1 found 2 matches.\n\nTotal occurrences: 3\n"
        );
    }
}
