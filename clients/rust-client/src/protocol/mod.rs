mod error;
mod response;
mod types;

pub use error::{ConnectionFailure, ErrorCode, QueryApiError, ServerError};
pub use response::{QueryApiResponse, StatementRequest, TransactionInfo};
pub use types::{TransactionContext, TransactionMode};

/// Header used by clustered deployments to pin a transaction to one member
pub const CLUSTER_AFFINITY_HEADER: &str = "neo4j-cluster-affinity";
