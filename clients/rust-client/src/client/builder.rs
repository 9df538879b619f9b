use super::{
    ConnectionKind, EphemeralTransport, PersistentTransport, QueryApiClient, QueryApiError,
    Transport, TransportSettings,
};
use base64::Engine;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct QueryApiClientBuilder {
    url: String,
    database: Option<String>,
    credentials: Option<(String, String)>,
    timeout: Duration,
    connection: ConnectionKind,
    settings: TransportSettings,
    transport: Option<Arc<dyn Transport>>,
}

impl QueryApiClientBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            database: None,
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connection: ConnectionKind::default(),
            settings: TransportSettings::default(),
            transport: None,
        }
    }

    pub fn auth(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connection(mut self, kind: ConnectionKind) -> Self {
        self.connection = kind;
        self
    }

    pub fn multiplexed(mut self, multiplexed: bool) -> Self {
        self.settings.multiplexed = multiplexed;
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.settings.pool_size = size;
        self
    }

    /// Use a caller-supplied transport instead of building one
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<QueryApiClient, QueryApiError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(QueryApiError::Config(format!(
                "Url must start with http:// or https://, got '{}'",
                self.url
            )));
        }

        let database = self
            .database
            .filter(|d| !d.is_empty())
            .ok_or_else(|| QueryApiError::Config("No database specified".to_string()))?;

        let auth = self
            .credentials
            .map(|(username, password)| basic_auth_header(&username, &password))
            .transpose()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => match self.connection {
                ConnectionKind::Ephemeral => Arc::new(EphemeralTransport::new()),
                ConnectionKind::Persistent => Arc::new(PersistentTransport::new(self.settings)?),
            },
        };

        let query_api = format!("{}/db/{}/query/v2", self.url, database);

        Ok(QueryApiClient::new(query_api, auth, self.timeout, transport))
    }
}

fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue, QueryApiError> {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    let mut value = HeaderValue::from_str(&format!("Basic {}", encoded))
        .map_err(|e| QueryApiError::Config(format!("Invalid credentials: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}
