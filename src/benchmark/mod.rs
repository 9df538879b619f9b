//! Benchmark catalogue and runner
//!
//! Every benchmark label is one combination of connection strategy,
//! execution mode and transaction mode.

mod progress;
mod runner;

pub use progress::{progress_bar, NoProgress, Progress};
pub use runner::{run_concurrent, run_sequential, BenchmarkRunner, RunState};

use clap::ValueEnum;
use query_api_client::{ConnectionKind, TransactionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    /// Bounded worker pool
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum BenchmarkKind {
    #[value(name = "Sync")]
    Sync,
    #[value(name = "SyncSessions")]
    SyncSessions,
    #[value(name = "Threads")]
    Threads,
    #[value(name = "ThreadsSessions")]
    ThreadsSessions,
    #[value(name = "SyncImplicit")]
    SyncImplicit,
    #[value(name = "SyncSessionsImplicit")]
    SyncSessionsImplicit,
    #[value(name = "ThreadsImplicit")]
    ThreadsImplicit,
    #[value(name = "ThreadsSessionsImplicit")]
    ThreadsSessionsImplicit,
}

impl BenchmarkKind {
    pub const ALL: [BenchmarkKind; 8] = [
        BenchmarkKind::Sync,
        BenchmarkKind::SyncSessions,
        BenchmarkKind::Threads,
        BenchmarkKind::ThreadsSessions,
        BenchmarkKind::SyncImplicit,
        BenchmarkKind::SyncSessionsImplicit,
        BenchmarkKind::ThreadsImplicit,
        BenchmarkKind::ThreadsSessionsImplicit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BenchmarkKind::Sync => "Sync",
            BenchmarkKind::SyncSessions => "SyncSessions",
            BenchmarkKind::Threads => "Threads",
            BenchmarkKind::ThreadsSessions => "ThreadsSessions",
            BenchmarkKind::SyncImplicit => "SyncImplicit",
            BenchmarkKind::SyncSessionsImplicit => "SyncSessionsImplicit",
            BenchmarkKind::ThreadsImplicit => "ThreadsImplicit",
            BenchmarkKind::ThreadsSessionsImplicit => "ThreadsSessionsImplicit",
        }
    }

    pub fn connection(&self) -> ConnectionKind {
        match self {
            BenchmarkKind::Sync
            | BenchmarkKind::Threads
            | BenchmarkKind::SyncImplicit
            | BenchmarkKind::ThreadsImplicit => ConnectionKind::Ephemeral,
            BenchmarkKind::SyncSessions
            | BenchmarkKind::ThreadsSessions
            | BenchmarkKind::SyncSessionsImplicit
            | BenchmarkKind::ThreadsSessionsImplicit => ConnectionKind::Persistent,
        }
    }

    pub fn execution(&self) -> ExecutionMode {
        match self {
            BenchmarkKind::Sync
            | BenchmarkKind::SyncSessions
            | BenchmarkKind::SyncImplicit
            | BenchmarkKind::SyncSessionsImplicit => ExecutionMode::Sequential,
            BenchmarkKind::Threads
            | BenchmarkKind::ThreadsSessions
            | BenchmarkKind::ThreadsImplicit
            | BenchmarkKind::ThreadsSessionsImplicit => ExecutionMode::Concurrent,
        }
    }

    pub fn transaction_mode(&self) -> TransactionMode {
        match self {
            BenchmarkKind::Sync
            | BenchmarkKind::SyncSessions
            | BenchmarkKind::Threads
            | BenchmarkKind::ThreadsSessions => TransactionMode::Explicit,
            BenchmarkKind::SyncImplicit
            | BenchmarkKind::SyncSessionsImplicit
            | BenchmarkKind::ThreadsImplicit
            | BenchmarkKind::ThreadsSessionsImplicit => TransactionMode::Implicit,
        }
    }

    /// Name shown next to the progress bar
    pub fn progress_label(&self) -> String {
        format!("TX{}", self.label())
    }
}

impl std::fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
