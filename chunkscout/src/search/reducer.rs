use tracing::info;

use crate::errors::{SearchError, SearchResult};
use crate::results::{AggregateResult, WorkerResult};

/// Sums the partial counts once every worker has reported.
///
/// `results` may arrive in any order but must hold exactly one entry per worker
/// index in `0..worker_count`; anything else means the barrier was broken and the
/// run is rejected rather than reported short.
pub fn reduce(results: Vec<WorkerResult>, worker_count: usize) -> SearchResult<AggregateResult> {
    if results.len() != worker_count {
        return Err(SearchError::invalid_argument(format!(
            "expected {} worker results, got {}",
            worker_count,
            results.len()
        )));
    }

    let mut slots: Vec<Option<WorkerResult>> = vec![None; worker_count];
    for result in results {
        let slot = slots.get_mut(result.worker_index).ok_or_else(|| {
            SearchError::invalid_argument(format!(
                "result from unknown worker {}",
                result.worker_index
            ))
        })?;
        if slot.replace(result).is_some() {
            return Err(SearchError::invalid_argument(format!(
                "worker {} reported twice",
                result.worker_index
            )));
        }
    }

    // Every slot is filled: the lengths match and no index was seen twice
    let per_worker: Vec<WorkerResult> = slots.into_iter().flatten().collect();

    for result in &per_worker {
        info!(
            "Worker {} found {} matches",
            result.worker_index, result.match_count
        );
    }
    let total_matches = per_worker.iter().map(|r| r.match_count).sum();
    info!("Total occurrences: {}", total_matches);

    Ok(AggregateResult {
        per_worker,
        total_matches,
    })
}
