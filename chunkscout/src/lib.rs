pub mod config;
pub mod errors;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::{CliOverrides, EncodingMode, ScanConfig};
pub use errors::{SearchError, SearchResult};
pub use results::{AggregateResult, ScanOutput, WorkAssignment, WorkerResult};
pub use search::scan;
