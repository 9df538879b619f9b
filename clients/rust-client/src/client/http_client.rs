use super::{ConnectionKind, QueryApiError, Transport};
use crate::protocol::{
    QueryApiResponse, StatementRequest, TransactionContext, TransactionMode,
    CLUSTER_AFFINITY_HEADER,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

/// Client for the transaction endpoints of one database.
///
/// Cheap to share behind an `Arc`; it holds no per-transaction state.
pub struct QueryApiClient {
    query_api: String,
    auth: Option<HeaderValue>,
    timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl QueryApiClient {
    pub(crate) fn new(
        query_api: String,
        auth: Option<HeaderValue>,
        timeout: Duration,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            query_api,
            auth,
            timeout,
            transport,
        }
    }

    /// Base query path, `{url}/db/{database}/query/v2`
    pub fn query_api(&self) -> &str {
        &self.query_api
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connection_kind(&self) -> ConnectionKind {
        self.transport.kind()
    }

    /// Release the underlying transport
    pub fn close(&self) {
        self.transport.close();
    }

    fn headers(&self, affinity: Option<&str>) -> Result<HeaderMap, QueryApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(auth) = &self.auth {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        if let Some(token) = affinity.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(token).map_err(|e| {
                QueryApiError::Config(format!("Invalid cluster affinity token: {}", e))
            })?;
            headers.insert(HeaderName::from_static(CLUSTER_AFFINITY_HEADER), value);
        }
        Ok(headers)
    }

    fn build_request(
        &self,
        url: &str,
        affinity: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Request, QueryApiError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| QueryApiError::Config(format!("Invalid url {}: {}", url, e)))?;
        let mut request = reqwest::Request::new(reqwest::Method::POST, parsed);
        *request.headers_mut() = self.headers(affinity)?;
        *request.timeout_mut() = Some(self.timeout);
        if let Some(b) = body {
            *request.body_mut() = Some(reqwest::Body::from(b));
        }
        Ok(request)
    }

    async fn post(
        &self,
        path: &str,
        affinity: Option<&str>,
        statement: Option<&str>,
    ) -> Result<(HeaderMap, QueryApiResponse), QueryApiError> {
        let url = format!("{}{}", self.query_api, path);
        let body = statement
            .map(|statement| serde_json::to_vec(&StatementRequest { statement }))
            .transpose()
            .map_err(|e| QueryApiError::Config(format!("Failed to encode statement: {}", e)))?;

        tracing::debug!(url = %url, affinity = affinity.is_some(), "query api call");

        let request = self.build_request(&url, affinity, body)?;
        let response = self.transport.execute(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| QueryApiError::from_reqwest(&url, e))?;

        let body = interpret_response(&url, status, &text)?;
        Ok((headers, body))
    }

    /// Open an explicit transaction.
    ///
    /// A response without a transaction id yields an empty id; the next call
    /// against it fails at the server.
    pub async fn begin(&self) -> Result<TransactionContext, QueryApiError> {
        let (headers, body) = self.post("/tx", None, None).await?;

        let id = match body.transaction_id() {
            Some(id) => id.to_string(),
            None => {
                tracing::warn!(url = %self.query_api, "begin response carried no transaction id");
                String::new()
            }
        };

        let affinity = headers
            .get(CLUSTER_AFFINITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::trace!(tx_id = %id, expires = ?body.expires(), "transaction opened");

        Ok(TransactionContext::new(id, affinity).with_expires(body.expires().map(str::to_string)))
    }

    pub async fn run_statement(
        &self,
        tx: &TransactionContext,
        statement: &str,
    ) -> Result<(), QueryApiError> {
        self.post(&format!("/tx/{}", tx.id()), tx.affinity(), Some(statement))
            .await?;
        Ok(())
    }

    pub async fn commit(&self, tx: TransactionContext) -> Result<(), QueryApiError> {
        self.post(&format!("/tx/{}/commit", tx.id()), tx.affinity(), None)
            .await?;
        Ok(())
    }

    /// Run a statement in a transaction the server begins and commits itself
    pub async fn run_implicit(&self, statement: &str) -> Result<(), QueryApiError> {
        self.post("", None, Some(statement)).await?;
        Ok(())
    }

    /// One complete statement execution in the given mode
    pub async fn execute_cycle(
        &self,
        mode: TransactionMode,
        statement: &str,
    ) -> Result<(), QueryApiError> {
        match mode {
            TransactionMode::Explicit => {
                let tx = self.begin().await?;
                self.run_statement(&tx, statement).await?;
                self.commit(tx).await
            }
            TransactionMode::Implicit => self.run_implicit(statement).await,
        }
    }
}

/// Classify a Query API response: error list first, then status, then shape.
fn interpret_response(
    url: &str,
    status: StatusCode,
    text: &str,
) -> Result<QueryApiResponse, QueryApiError> {
    if text.trim().is_empty() {
        if !status.is_success() {
            return Err(QueryApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: String::new(),
            });
        }
        return Ok(QueryApiResponse::default());
    }

    let body: QueryApiResponse = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(QueryApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text.to_string(),
            })
        }
        Err(e) => {
            return Err(QueryApiError::MalformedResponse {
                url: url.to_string(),
                message: format!("{} - Text: {}", e, text),
            })
        }
    };

    if !body.errors.is_empty() {
        return Err(QueryApiError::Protocol {
            url: url.to_string(),
            errors: body.errors,
        });
    }

    if !status.is_success() {
        return Err(QueryApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: text.to_string(),
        });
    }

    Ok(body)
}
