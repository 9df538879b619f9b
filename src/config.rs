use crate::error::{BenchError, BenchResult};
use query_api_client::{ConnectionKind, QueryApiClientBuilder};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NUM_REQUESTS: usize = 5;
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Settings for a benchmark invocation. Fixed once the runner is built.
#[derive(Clone)]
pub struct BenchConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub statement: String,
    pub repetitions: usize,
    pub timeout: Duration,
    pub workers: usize,
    pub multiplexed: bool,
    pub output_table: bool,
    pub output_graph: bool,
    pub output_dir: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:7474".to_string(),
            username: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            statement: "RETURN 1".to_string(),
            repetitions: DEFAULT_NUM_REQUESTS,
            timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
            workers: DEFAULT_MAX_WORKERS,
            multiplexed: false,
            output_table: true,
            output_graph: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl std::fmt::Debug for BenchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("statement", &self.statement)
            .field("repetitions", &self.repetitions)
            .field("timeout", &self.timeout)
            .field("workers", &self.workers)
            .field("multiplexed", &self.multiplexed)
            .field("output_table", &self.output_table)
            .field("output_graph", &self.output_graph)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl BenchConfig {
    pub fn validate(&self) -> BenchResult<()> {
        if self.url.is_empty() {
            return Err(BenchError::Config("No Query API url specified".to_string()));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(BenchError::Config(format!(
                "Url must start with http:// or https://, got '{}'",
                self.url
            )));
        }
        if self.database.is_empty() {
            return Err(BenchError::Config("No database specified".to_string()));
        }
        if self.statement.trim().is_empty() {
            return Err(BenchError::Config("No statement specified".to_string()));
        }
        if self.repetitions == 0 {
            return Err(BenchError::Config(
                "Number of requests must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BenchError::Config(
                "Number of workers must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(BenchError::Config(
                "Network timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Client builder targeting this configuration's endpoint
    pub fn client_builder(&self, connection: ConnectionKind) -> QueryApiClientBuilder {
        QueryApiClientBuilder::new(&self.url)
            .auth(&self.username, &self.password)
            .database(&self.database)
            .timeout(self.timeout)
            .connection(connection)
            .multiplexed(self.multiplexed)
            .pool_size(self.workers)
    }
}
