use std::fmt;
use tracing::{debug, info};

use super::coordinator::Coordinator;
use super::index::LineIndex;
use super::matcher::PatternMatcher;
use super::plan::PartitionPlan;
use super::reducer::reduce;
use super::worker::ChunkScanner;
use crate::config::ScanConfig;
use crate::errors::SearchResult;
use crate::metrics::ScanMetrics;
use crate::results::ScanOutput;

/// The stages of one run, entered strictly in this order.
///
/// The `-ing` stages are entered when their work starts. `Reduced` is entered once
/// the aggregate exists, `Done` once the run's bookkeeping is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Indexing,
    Planning,
    /// Entered by the coordinator before the first assignment is sent
    Dispatching,
    /// Entered by the coordinator once every assignment has been sent
    Collecting,
    Reduced,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Indexing => "indexing",
            Stage::Planning => "planning",
            Stage::Dispatching => "dispatching",
            Stage::Collecting => "collecting",
            Stage::Reduced => "reduced",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

pub(crate) fn enter(stage: Stage) {
    debug!(%stage, "Entering stage");
}

/// Counts `config.keyword` in `config.path` across a pool of workers.
///
/// Arguments and the keyword are validated before the file is touched, and the
/// file is indexed before any worker is launched, so a missing file never
/// starts the pool.
pub fn scan(config: &ScanConfig) -> SearchResult<ScanOutput> {
    config.validate()?;
    let matcher = PatternMatcher::new(config.keyword.as_str())?;
    let metrics = ScanMetrics::new();

    info!(
        "Scanning {} for {:?} with {} workers",
        config.path.display(),
        config.keyword,
        config.worker_count
    );

    enter(Stage::Indexing);
    let index = LineIndex::build_with_metrics(&config.path, &metrics)?;

    enter(Stage::Planning);
    let plan = PartitionPlan::new(index.total_lines(), config.worker_count)?;
    debug!(
        "Plan: {} workers, {} lines each, {} for the last",
        plan.worker_count, plan.chunk_size, plan.last_chunk_size
    );

    let scanner =
        ChunkScanner::with_metrics(matcher.clone(), config.encoding_mode, metrics.clone());
    let results = Coordinator::new(&config.path, matcher)
        .with_scanner(scanner)
        .with_timeout(config.worker_timeout)
        .run(&plan, &index)?;

    let aggregate = reduce(results, plan.worker_count)?;
    enter(Stage::Reduced);

    metrics.log_stats();
    enter(Stage::Done);

    Ok(ScanOutput {
        path: config.path.clone(),
        total_lines: index.total_lines(),
        plan,
        aggregate,
        stats: metrics.get_stats(),
    })
}
