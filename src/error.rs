use query_api_client::QueryApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Client(#[from] QueryApiError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Invalid run state transition: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BenchResult<T> = Result<T, BenchError>;

impl BenchError {
    /// The underlying Query API error, if the failure came from a call
    pub fn client_error(&self) -> Option<&QueryApiError> {
        match self {
            BenchError::Client(err) => Some(err),
            _ => None,
        }
    }
}
