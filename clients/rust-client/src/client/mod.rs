mod builder;
mod http_client;
mod transport;

pub use builder::QueryApiClientBuilder;
pub use http_client::QueryApiClient;
pub use transport::{
    ConnectionKind, EphemeralTransport, PersistentTransport, Transport, TransportSettings,
};

use super::protocol::QueryApiError;
