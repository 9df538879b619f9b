use super::{BenchmarkKind, ExecutionMode, Progress};
use crate::config::BenchConfig;
use crate::error::{BenchError, BenchResult};
use query_api_client::{QueryApiClient, TransactionMode};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed { elapsed_secs: f64 },
    Aborted { reason: String },
}

impl RunState {
    pub fn start(&mut self) -> BenchResult<()> {
        match self {
            RunState::NotStarted => {
                *self = RunState::Running;
                Ok(())
            }
            other => Err(BenchError::State(format!("cannot start a run in state {:?}", other))),
        }
    }

    pub fn complete(&mut self, elapsed_secs: f64) -> BenchResult<()> {
        match self {
            RunState::Running => {
                *self = RunState::Completed { elapsed_secs };
                Ok(())
            }
            other => Err(BenchError::State(format!(
                "cannot complete a run in state {:?}",
                other
            ))),
        }
    }

    pub fn abort(&mut self, reason: impl Into<String>) -> BenchResult<()> {
        match self {
            RunState::Running => {
                *self = RunState::Aborted {
                    reason: reason.into(),
                };
                Ok(())
            }
            other => Err(BenchError::State(format!("cannot abort a run in state {:?}", other))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed { .. } | RunState::Aborted { .. })
    }
}

/// Closes the client's transport when the run scope ends, however it ends
struct TransportGuard(Arc<QueryApiClient>);

impl Drop for TransportGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

pub struct BenchmarkRunner {
    config: Arc<BenchConfig>,
}

impl BenchmarkRunner {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Build the client a benchmark label calls for
    pub fn client_for(&self, kind: BenchmarkKind) -> BenchResult<QueryApiClient> {
        Ok(self.config.client_builder(kind.connection()).build()?)
    }

    /// Run one benchmark and return its wall-clock time in seconds
    pub async fn run(&self, kind: BenchmarkKind, progress: Arc<dyn Progress>) -> BenchResult<f64> {
        let client = Arc::new(self.client_for(kind)?);
        self.run_with_client(kind, client, progress).await
    }

    /// Run one benchmark against an already built client.
    ///
    /// The client's transport is closed exactly once when this returns.
    pub async fn run_with_client(
        &self,
        kind: BenchmarkKind,
        client: Arc<QueryApiClient>,
        progress: Arc<dyn Progress>,
    ) -> BenchResult<f64> {
        let _guard = TransportGuard(client.clone());
        let mut state = RunState::NotStarted;
        state.start()?;

        tracing::info!(
            benchmark = %kind,
            connection = %client.connection_kind(),
            repetitions = self.config.repetitions,
            "benchmark started"
        );

        let statement: Arc<str> = Arc::from(self.config.statement.as_str());
        let result = match kind.execution() {
            ExecutionMode::Sequential => {
                run_sequential(
                    self.config.repetitions,
                    &statement,
                    &client,
                    kind.transaction_mode(),
                    progress.as_ref(),
                )
                .await
            }
            ExecutionMode::Concurrent => {
                run_concurrent(
                    self.config.repetitions,
                    statement,
                    client.clone(),
                    kind.transaction_mode(),
                    self.config.workers,
                    progress.clone(),
                )
                .await
            }
        };
        progress.finish();

        match result {
            Ok(elapsed) => {
                state.complete(elapsed)?;
                tracing::info!(benchmark = %kind, elapsed_secs = elapsed, "benchmark completed");
                Ok(elapsed)
            }
            Err(e) => {
                state.abort(e.to_string())?;
                tracing::error!(benchmark = %kind, error = %e, "benchmark aborted");
                Err(e)
            }
        }
    }
}

/// Execute `n` statement cycles one after another on the calling task.
///
/// The first failure ends the run.
pub async fn run_sequential(
    n: usize,
    statement: &str,
    client: &QueryApiClient,
    mode: TransactionMode,
    progress: &dyn Progress,
) -> BenchResult<f64> {
    let start = Instant::now();
    for _ in 0..n {
        client.execute_cycle(mode, statement).await?;
        progress.advance();
    }
    Ok(start.elapsed().as_secs_f64())
}

/// Execute `n` statement cycles on a pool of at most `workers` tasks.
///
/// Workers claim repetitions from a shared counter. After the first failure
/// no new repetition is claimed; calls already in flight run to completion.
/// The elapsed time covers pool start-up through the join of every worker.
pub async fn run_concurrent(
    n: usize,
    statement: Arc<str>,
    client: Arc<QueryApiClient>,
    mode: TransactionMode,
    workers: usize,
    progress: Arc<dyn Progress>,
) -> BenchResult<f64> {
    let start = Instant::now();
    let pool_size = workers.max(1).min(n.max(1));

    let next = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    let mut set = JoinSet::new();

    for worker_id in 0..pool_size {
        let next = next.clone();
        let stop = stop.clone();
        let client = client.clone();
        let statement = statement.clone();
        let progress = progress.clone();

        set.spawn(async move {
            loop {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                if next.fetch_add(1, Ordering::AcqRel) >= n {
                    break;
                }
                if let Err(e) = client.execute_cycle(mode, &statement).await {
                    stop.store(true, Ordering::Release);
                    tracing::debug!(worker_id, error = %e, "worker stopping after failure");
                    return Err(e);
                }
                progress.advance();
            }
            Ok(())
        });
    }

    let mut first_error: Option<BenchError> = None;
    while let Some(joined) = set.join_next().await {
        let outcome = match joined {
            Ok(result) => result.map_err(BenchError::from),
            Err(e) => Err(BenchError::Worker(e.to_string())),
        };
        if let Err(e) = outcome {
            stop.store(true, Ordering::Release);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(start.elapsed().as_secs_f64()),
    }
}
