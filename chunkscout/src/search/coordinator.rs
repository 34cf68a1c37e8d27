use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace};

use super::engine::{enter, Stage};
use super::index::LineIndex;
use super::matcher::PatternMatcher;
use super::plan::PartitionPlan;
use super::worker::{run_worker, ChunkScanner, WorkerReport};
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanMetrics;
use crate::results::{WorkAssignment, WorkerResult};

/// The coordinator's half of one worker's channel pair
struct WorkerLink {
    index: usize,
    assignments: Sender<WorkAssignment>,
    reports: Receiver<WorkerReport>,
}

/// Launches one worker per planned chunk and waits for every one of them.
///
/// Each worker runs on its own thread of a dedicated rayon pool sized to the plan,
/// and talks to the coordinator over two private capacity-1 channels: one
/// assignment in, one report out. Results are collected in worker-index order; a
/// worker that finishes early simply waits in its channel until its turn.
///
/// Without a timeout the collection blocks until every worker has reported. With
/// one, the whole run shares a single deadline and the first worker still silent
/// when it passes fails the run; threads still working are abandoned with the pool.
#[derive(Debug, Clone)]
pub struct Coordinator {
    path: PathBuf,
    scanner: ChunkScanner,
    timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(path: impl Into<PathBuf>, matcher: PatternMatcher) -> Self {
        Self {
            path: path.into(),
            scanner: ChunkScanner::new(matcher, EncodingMode::default()),
            timeout: None,
        }
    }

    /// Replaces the scanner workers are launched with
    pub fn with_scanner(mut self, scanner: ChunkScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Bounds the time spent waiting for results. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn metrics(&self) -> &ScanMetrics {
        self.scanner.metrics()
    }

    /// Dispatches every chunk of `plan` and returns one result per worker, in index order
    pub fn run(&self, plan: &PartitionPlan, index: &LineIndex) -> SearchResult<Vec<WorkerResult>> {
        let assignments = plan.assignments(index)?;
        self.dispatch(assignments)
    }

    /// Runs the given assignments, one worker each
    pub fn dispatch(&self, assignments: Vec<WorkAssignment>) -> SearchResult<Vec<WorkerResult>> {
        self.dispatch_with(assignments, run_worker)
    }

    fn dispatch_with<F>(
        &self,
        assignments: Vec<WorkAssignment>,
        worker: F,
    ) -> SearchResult<Vec<WorkerResult>>
    where
        F: Fn(usize, PathBuf, ChunkScanner, Receiver<WorkAssignment>, Sender<WorkerReport>)
            + Clone
            + Send
            + 'static,
    {
        let worker_count = assignments.len();
        if worker_count == 0 {
            return Err(SearchError::invalid_argument("no work assignments to dispatch"));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("scan-worker-{}", i))
            .panic_handler(|_| error!("Scan worker panicked"))
            .build()
            .map_err(|e| {
                SearchError::worker_failed(0, format!("could not start worker pool: {}", e))
            })?;

        let links: Vec<WorkerLink> = (0..worker_count)
            .map(|index| {
                let (assign_tx, assign_rx) = bounded(1);
                let (report_tx, report_rx) = bounded(1);
                let path = self.path.clone();
                let scanner = self.scanner.clone();
                let worker = worker.clone();
                pool.spawn(move || worker(index, path, scanner, assign_rx, report_tx));
                WorkerLink {
                    index,
                    assignments: assign_tx,
                    reports: report_rx,
                }
            })
            .collect();
        debug!("Launched {} workers for {}", worker_count, self.path.display());

        enter(Stage::Dispatching);
        for (link, assignment) in links.iter().zip(assignments) {
            trace!("Sending {:?}", assignment);
            link.assignments.send(assignment).map_err(|_| {
                SearchError::worker_failed(link.index, "worker exited before its assignment")
            })?;
        }

        enter(Stage::Collecting);
        let results = self.collect(&links)?;
        debug!("All {} workers reported", worker_count);
        Ok(results)
    }

    fn collect(&self, links: &[WorkerLink]) -> SearchResult<Vec<WorkerResult>> {
        let deadline = self.timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let mut results = Vec::with_capacity(links.len());

        for link in links {
            let report = match deadline {
                Some((at, timeout)) => link.reports.recv_deadline(at).map_err(|e| match e {
                    RecvTimeoutError::Timeout => SearchError::WorkerTimeout {
                        index: link.index,
                        timeout,
                    },
                    RecvTimeoutError::Disconnected => {
                        SearchError::worker_failed(link.index, "exited without reporting")
                    }
                })?,
                None => link.reports.recv().map_err(|_| {
                    SearchError::worker_failed(link.index, "exited without reporting")
                })?,
            };

            let result = report?;
            trace!(
                "Worker {} reported {} matches",
                result.worker_index,
                result.match_count
            );
            results.push(result);
        }

        Ok(results)
    }
}

/// Runs one worker per chunk of `plan` and waits indefinitely for all of them
pub fn run(
    path: &Path,
    pattern: &str,
    plan: &PartitionPlan,
    index: &LineIndex,
) -> SearchResult<Vec<WorkerResult>> {
    let matcher = PatternMatcher::new(pattern)?;
    Coordinator::new(path, matcher).run(plan, index)
}
