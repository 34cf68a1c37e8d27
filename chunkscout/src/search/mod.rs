//! This module splits one file into line chunks and counts a keyword in each chunk
//! on its own worker, demonstrating Rust's channel-based concurrency compared to
//! .NET's Task Parallel Library (TPL).
//!
//! # .NET vs Rust Worker Pools
//!
//! In .NET, you might fan the chunks out as tasks and wait on all of them:
//! ```csharp
//! var tasks = chunks.Select(c => Task.Run(() => CountMatches(path, keyword, c)));
//! var counts = await Task.WhenAll(tasks);
//! var total = counts.Sum();
//! ```
//!
//! In Rust, each worker owns a private pair of channels. The coordinator sends one
//! assignment in and receives one report out, so no state is shared between workers:
//! ```rust,ignore
//! let (assign_tx, assign_rx) = bounded(1);
//! let (report_tx, report_rx) = bounded(1);
//! pool.spawn(move || run_worker(index, path, scanner, assign_rx, report_tx));
//! assign_tx.send(assignment)?;
//! let result = report_rx.recv()??;
//! ```
//!
//! # Pipeline
//!
//! 1. **Indexing** ([`index`]): one pass over the file records where every line ends
//! 2. **Planning** ([`plan`]): equal chunks, with the remainder folded into the last
//! 3. **Dispatching / Collecting** ([`coordinator`], [`worker`]): one worker per chunk,
//!    results gathered in worker-index order behind a full barrier
//! 4. **Reducing** ([`reducer`]): the partial counts are summed

pub mod coordinator;
pub mod engine;
pub mod index;
pub mod matcher;
pub mod plan;
pub mod reducer;
pub mod worker;

pub use coordinator::Coordinator;
pub use engine::{scan, Stage};
pub use index::LineIndex;
pub use matcher::PatternMatcher;
pub use plan::PartitionPlan;
pub use reducer::reduce;
pub use worker::ChunkScanner;
