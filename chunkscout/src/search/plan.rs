use tracing::debug;

use super::index::LineIndex;
use crate::errors::{SearchError, SearchResult};
use crate::results::WorkAssignment;

/// How the lines of a file are divided between workers.
///
/// Every worker but the last gets `chunk_size` lines; the last gets
/// `last_chunk_size`, which absorbs the whole remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    pub worker_count: usize,
    pub chunk_size: usize,
    pub last_chunk_size: usize,
    pub total_lines: usize,
}

impl PartitionPlan {
    /// Plans `total_lines` across at most `requested_workers` workers.
    ///
    /// The worker count is clamped to the line count so no worker is idle. An empty
    /// file still gets one worker, which is assigned zero lines.
    pub fn new(total_lines: usize, requested_workers: usize) -> SearchResult<Self> {
        if requested_workers == 0 {
            return Err(SearchError::invalid_argument(
                "worker count must be at least 1",
            ));
        }

        let worker_count = requested_workers.min(total_lines).max(1);
        let chunk_size = total_lines / worker_count;
        let last_chunk_size = chunk_size + total_lines % worker_count;

        if worker_count < requested_workers {
            debug!(
                "Clamped {} requested workers to {} ({} lines)",
                requested_workers, worker_count, total_lines
            );
        }

        Ok(Self {
            worker_count,
            chunk_size,
            last_chunk_size,
            total_lines,
        })
    }

    /// Lines assigned to `worker_index`
    pub fn line_count_for(&self, worker_index: usize) -> usize {
        if worker_index + 1 == self.worker_count {
            self.last_chunk_size
        } else {
            self.chunk_size
        }
    }

    /// First line assigned to `worker_index`
    pub fn first_line_for(&self, worker_index: usize) -> usize {
        worker_index * self.chunk_size
    }

    /// Builds the assignment for every worker, resolving start lines to byte offsets
    pub fn assignments(&self, index: &LineIndex) -> SearchResult<Vec<WorkAssignment>> {
        if index.total_lines() != self.total_lines {
            return Err(SearchError::invalid_argument(format!(
                "plan covers {} lines but the index has {}",
                self.total_lines,
                index.total_lines()
            )));
        }

        (0..self.worker_count)
            .map(|worker_index| {
                let first_line = self.first_line_for(worker_index);
                let start_byte_offset = index.line_start(first_line).ok_or_else(|| {
                    SearchError::invalid_argument(format!(
                        "line {} is outside the index",
                        first_line
                    ))
                })?;
                Ok(WorkAssignment {
                    worker_index,
                    start_byte_offset,
                    line_count: self.line_count_for(worker_index),
                    first_line,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counts_sum_to_total() {
        for total_lines in 1..=60 {
            for requested in 1..=total_lines {
                let plan = PartitionPlan::new(total_lines, requested).unwrap();
                let sum: usize = (0..plan.worker_count)
                    .map(|i| plan.line_count_for(i))
                    .sum();
                assert_eq!(sum, total_lines, "lines={} workers={}", total_lines, requested);
            }
        }
    }

    #[test]
    fn test_only_last_worker_absorbs_remainder() {
        for total_lines in 1..=40 {
            for requested in 1..=total_lines {
                let plan = PartitionPlan::new(total_lines, requested).unwrap();
                assert_eq!(plan.worker_count, requested);
                assert_eq!(plan.chunk_size, total_lines / requested);
                assert_eq!(
                    plan.last_chunk_size,
                    plan.chunk_size + total_lines % requested
                );
                for i in 0..plan.worker_count - 1 {
                    assert_eq!(plan.line_count_for(i), plan.chunk_size);
                }
            }
        }
    }

    #[test]
    fn test_clamps_to_line_count() {
        let plan = PartitionPlan::new(3, 10).unwrap();
        assert_eq!(plan.worker_count, 3);
        assert_eq!(plan.chunk_size, 1);
        assert_eq!(plan.last_chunk_size, 1);
    }

    #[test]
    fn test_empty_file_gets_one_idle_worker() {
        let plan = PartitionPlan::new(0, 4).unwrap();
        assert_eq!(plan.worker_count, 1);
        assert_eq!(plan.chunk_size, 0);
        assert_eq!(plan.last_chunk_size, 0);

        let assignments = plan.assignments(&LineIndex::default()).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].start_byte_offset, 0);
        assert_eq!(assignments[0].line_count, 0);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = PartitionPlan::new(10, 0).unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[test]
    fn test_assignments_start_at_first_line_of_chunk() {
        let index = LineIndex::from_bytes(b"foo\nbar\nfoo\nbaz\nfoo\n");
        let plan = PartitionPlan::new(index.total_lines(), 2).unwrap();
        assert_eq!(plan.chunk_size, 2);
        assert_eq!(plan.last_chunk_size, 3);

        let assignments = plan.assignments(&index).unwrap();
        assert_eq!(
            assignments,
            vec![
                WorkAssignment {
                    worker_index: 0,
                    start_byte_offset: 0,
                    line_count: 2,
                    first_line: 0,
                },
                WorkAssignment {
                    worker_index: 1,
                    start_byte_offset: 8,
                    line_count: 3,
                    first_line: 2,
                },
            ]
        );
    }

    #[test]
    fn test_assignments_reject_mismatched_index() {
        let index = LineIndex::from_bytes(b"a\nb\n");
        let plan = PartitionPlan::new(5, 2).unwrap();
        assert!(plan.assignments(&index).is_err());
    }
}
