//! Neo4j Query API Rust Client
//!
//! Transaction client for the HTTP Query API (`/db/{db}/query/v2`) with two
//! interchangeable transports: an ephemeral one that opens a new connection
//! for every call and a persistent one that reuses a single pooled client.
//!
//! # Explicit transaction
//!
//! ```rust,no_run
//! use query_api_client::{ConnectionKind, QueryApiClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), query_api_client::QueryApiError> {
//!     let client = QueryApiClientBuilder::new("http://localhost:7474")
//!         .auth("neo4j", "password")
//!         .database("neo4j")
//!         .connection(ConnectionKind::Persistent)
//!         .build()?;
//!
//!     let tx = client.begin().await?;
//!     client.run_statement(&tx, "RETURN 1").await?;
//!     client.commit(tx).await?;
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! # Implicit transaction
//!
//! ```rust,no_run
//! use query_api_client::QueryApiClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), query_api_client::QueryApiError> {
//!     let client = QueryApiClientBuilder::new("http://localhost:7474")
//!         .auth("neo4j", "password")
//!         .database("neo4j")
//!         .build()?;
//!
//!     client.run_implicit("RETURN 1").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod protocol;

pub use client::{
    ConnectionKind, EphemeralTransport, PersistentTransport, QueryApiClient,
    QueryApiClientBuilder, Transport, TransportSettings,
};
pub use protocol::{
    ConnectionFailure, ErrorCode, QueryApiError, ServerError, TransactionContext,
    TransactionMode, CLUSTER_AFFINITY_HEADER,
};
