use super::QueryApiError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::time::Duration;

const POOL_IDLE_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionKind {
    /// New connection for every call
    #[default]
    Ephemeral,
    /// One pooled client shared by every call of a run
    Persistent,
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionKind::Ephemeral => write!(f, "ephemeral"),
            ConnectionKind::Persistent => write!(f, "persistent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Offer HTTP/2 during TLS negotiation so concurrent calls can share one
    /// connection; servers without it are spoken to over HTTP/1.1. Off pins
    /// HTTP/1.1. Applies to the persistent transport only.
    pub multiplexed: bool,
    /// Idle connections kept per host by the persistent client
    pub pool_size: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            multiplexed: false,
            pool_size: 16,
        }
    }
}

/// Sends fully built requests to the Query API.
///
/// Implementations must be safe to share between concurrent workers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, QueryApiError>;

    /// Release any held connections. Idempotent.
    fn close(&self);

    fn kind(&self) -> ConnectionKind;
}

/// One-shot HTTP/1.1 connection per call
#[derive(Debug, Default)]
pub struct EphemeralTransport;

impl EphemeralTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for EphemeralTransport {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, QueryApiError> {
        let url = request.url().to_string();

        // No idle pool: the connection dies with the client after this call
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .http1_only()
            .build()
            .map_err(|e| QueryApiError::from_reqwest(&url, e))?;

        client
            .execute(request)
            .await
            .map_err(|e| QueryApiError::from_reqwest(&url, e))
    }

    fn close(&self) {}

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Ephemeral
    }
}

pub struct PersistentTransport {
    client: RwLock<Option<reqwest::Client>>,
}

impl PersistentTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, QueryApiError> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .pool_max_idle_per_host(settings.pool_size.max(1))
            .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE_SECS))
            .tcp_nodelay(true);
        // With multiplexing on, HTTP/2 is chosen by ALPN and plain http stays on HTTP/1.1
        if !settings.multiplexed {
            builder = builder.http1_only();
        }
        let client = builder
            .build()
            .map_err(|e| QueryApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            multiplexed = settings.multiplexed,
            pool_size = settings.pool_size,
            "persistent transport opened"
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }
}

#[async_trait]
impl Transport for PersistentTransport {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, QueryApiError> {
        let url = request.url().to_string();
        // Clone the handle out so the lock is not held across the await
        let client = self
            .client
            .read()
            .clone()
            .ok_or(QueryApiError::TransportClosed)?;

        client
            .execute(request)
            .await
            .map_err(|e| QueryApiError::from_reqwest(&url, e))
    }

    fn close(&self) {
        if self.client.write().take().is_some() {
            tracing::debug!("persistent transport closed");
        }
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Persistent
    }
}
