// Benchmark domain models

mod host;
mod run;
mod sample;

pub use host::HostInfo;
pub use run::{BenchmarkRun, Extra, OperationResult, RunError};
pub use sample::{ResourceSummary, Sample};
