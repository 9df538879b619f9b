//! Query API Benchmarks
//!
//! Measures how fast a Neo4j Query API endpoint executes the same statement
//! under different strategies: explicit vs implicit transactions, a new
//! connection per call vs one persistent client, and sequential vs
//! worker-pool execution.

pub mod benchmark;
pub mod config;
pub mod error;
pub mod report;

pub use benchmark::{
    BenchmarkKind, BenchmarkRunner, ExecutionMode, NoProgress, Progress, RunState,
};
pub use config::BenchConfig;
pub use error::{BenchError, BenchResult};
pub use report::BenchmarkResults;
