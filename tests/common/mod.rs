//! Common test utilities for Query API tests
//!
//! Provides an in-process fake of the Query API transaction endpoints that
//! records every call it receives, plus small collaborators used by the
//! runner tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use query_api_bench::Progress;
use query_api_client::{ConnectionKind, QueryApiError, Transport};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub const AFFINITY_HEADER: &str = "neo4j-cluster-affinity";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub affinity: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct FakeOptions {
    pub database: String,
    /// Returned on every begin response when set
    pub affinity: Option<String>,
    /// (code, message) returned by every begin call
    pub begin_error: Option<(String, String)>,
    pub omit_tx_id: bool,
    /// Time each call takes server-side
    pub delay: Duration,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            database: "neo4j".to_string(),
            affinity: None,
            begin_error: None,
            omit_tx_id: false,
            delay: Duration::ZERO,
        }
    }
}

pub struct FakeQueryApi {
    options: FakeOptions,
    calls: Mutex<Vec<RecordedCall>>,
    next_tx: AtomicU64,
    open: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a FakeQueryApi);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeQueryApi {
    fn new(options: FakeOptions) -> Self {
        Self {
            options,
            calls: Mutex::new(Vec::new()),
            next_tx: AtomicU64::new(0),
            open: Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(self)
    }

    fn record(&self, path: String, headers: &HeaderMap, body: &Bytes) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let call = RecordedCall {
            path,
            affinity: header(AFFINITY_HEADER),
            authorization: header("authorization"),
            content_type: header("content-type"),
            accept: header("accept"),
            body: if body.is_empty() {
                None
            } else {
                serde_json::from_slice(body).ok()
            },
        };
        self.calls.lock().unwrap().push(call);
    }

    async fn pause(&self) {
        if !self.options.delay.is_zero() {
            tokio::time::sleep(self.options.delay).await;
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn open_transactions(&self) -> usize {
        self.open.lock().unwrap().len()
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"errors": [{"code": code, "message": message}]})),
    )
        .into_response()
}

fn database_check(api: &FakeQueryApi, db: &str) -> Option<Response> {
    if db != api.options.database {
        return Some(error_response(
            StatusCode::NOT_FOUND,
            "Neo.ClientError.Database.DatabaseNotFound",
            &format!("Graph not found: {}", db),
        ));
    }
    None
}

fn result_body() -> Value {
    json!({"data": {"fields": ["1"], "values": [[1]]}, "bookmarks": ["FB:fake"]})
}

async fn implicit(
    State(api): State<Arc<FakeQueryApi>>,
    Path(db): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = api.enter();
    api.record(format!("/db/{}/query/v2", db), &headers, &body);
    api.pause().await;
    if let Some(resp) = database_check(&api, &db) {
        return resp;
    }
    (StatusCode::ACCEPTED, Json(result_body())).into_response()
}

async fn begin(
    State(api): State<Arc<FakeQueryApi>>,
    Path(db): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = api.enter();
    api.record(format!("/db/{}/query/v2/tx", db), &headers, &body);
    api.pause().await;
    if let Some(resp) = database_check(&api, &db) {
        return resp;
    }
    if let Some((code, message)) = &api.options.begin_error {
        return error_response(StatusCode::UNAUTHORIZED, code, message);
    }

    let id = (api.next_tx.fetch_add(1, Ordering::SeqCst) + 1).to_string();
    api.open.lock().unwrap().insert(id.clone());

    let body = if api.options.omit_tx_id {
        json!({"transaction": {}})
    } else {
        json!({"transaction": {"id": id, "expires": "2030-01-01T00:00:30Z"}})
    };
    let mut response = (StatusCode::ACCEPTED, Json(body)).into_response();
    if let Some(affinity) = &api.options.affinity {
        response.headers_mut().insert(
            AFFINITY_HEADER,
            HeaderValue::from_str(affinity).unwrap(),
        );
    }
    response
}

async fn run_in_tx(
    State(api): State<Arc<FakeQueryApi>>,
    Path((db, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = api.enter();
    api.record(format!("/db/{}/query/v2/tx/{}", db, id), &headers, &body);
    api.pause().await;
    if let Some(resp) = database_check(&api, &db) {
        return resp;
    }
    if !api.open.lock().unwrap().contains(&id) {
        return error_response(
            StatusCode::NOT_FOUND,
            "Neo.ClientError.Transaction.TransactionNotFound",
            &format!("Transaction {} not found", id),
        );
    }
    (StatusCode::ACCEPTED, Json(result_body())).into_response()
}

async fn commit(
    State(api): State<Arc<FakeQueryApi>>,
    Path((db, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = api.enter();
    api.record(
        format!("/db/{}/query/v2/tx/{}/commit", db, id),
        &headers,
        &body,
    );
    api.pause().await;
    if let Some(resp) = database_check(&api, &db) {
        return resp;
    }
    if !api.open.lock().unwrap().remove(&id) {
        return error_response(
            StatusCode::NOT_FOUND,
            "Neo.ClientError.Transaction.TransactionNotFound",
            &format!("Transaction {} not found", id),
        );
    }
    (StatusCode::OK, Json(result_body())).into_response()
}

pub struct FakeServer {
    pub url: String,
    pub api: Arc<FakeQueryApi>,
}

pub async fn start_fake_server(options: FakeOptions) -> FakeServer {
    let api = Arc::new(FakeQueryApi::new(options));
    let app = Router::new()
        .route("/db/{db}/query/v2", post(implicit))
        .route("/db/{db}/query/v2/tx", post(begin))
        .route("/db/{db}/query/v2/tx/{id}", post(run_in_tx))
        .route("/db/{db}/query/v2/tx/{id}/commit", post(commit))
        .with_state(api.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeServer {
        url: format!("http://{}", addr),
        api,
    }
}

/// Port on localhost with nothing listening
pub fn unused_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Bare server that only speaks HTTP/1.1 and drops any other protocol
pub struct Http1OnlyServer {
    pub url: String,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl Http1OnlyServer {
    /// Request lines received, e.g. `POST /db/neo4j/query/v2 HTTP/1.1`
    pub fn request_lines(&self) -> Vec<String> {
        self.request_lines.lock().unwrap().clone()
    }
}

pub async fn start_http1_only_server() -> Http1OnlyServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let request_lines = Arc::new(Mutex::new(Vec::new()));

    let recorded = request_lines.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_http1(stream, recorded.clone()));
        }
    });

    Http1OnlyServer {
        url: format!("http://{}", addr),
        request_lines,
    }
}

async fn serve_http1(stream: TcpStream, recorded: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(stream);
    loop {
        let mut request_line = String::new();
        match reader.read_line(&mut request_line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let request_line = request_line.trim_end().to_string();

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            match reader.read_line(&mut header).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let is_http1 = request_line.ends_with("HTTP/1.1");
        recorded.lock().unwrap().push(request_line);
        // An HTTP/2 preface arrives as "PRI * HTTP/2.0"
        if !is_http1 {
            return;
        }

        let payload = json!({
            "transaction": {"id": "1", "expires": "2030-01-01T00:00:30Z"},
            "data": {"fields": [], "values": []}
        })
        .to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            payload.len(),
            payload
        );
        if reader.get_mut().write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

#[derive(Default)]
pub struct CountingProgress {
    pub advances: AtomicUsize,
    pub finishes: AtomicUsize,
}

impl CountingProgress {
    pub fn advances(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }
}

impl Progress for CountingProgress {
    fn advance(&self) {
        self.advances.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wraps a transport and counts how often it is used and closed
pub struct CountingTransport<T: Transport> {
    inner: T,
    pub executes: AtomicUsize,
    pub closes: AtomicUsize,
}

impl<T: Transport> CountingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            executes: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn executes(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Transport> Transport for CountingTransport<T> {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, QueryApiError> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(request).await
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }

    fn kind(&self) -> ConnectionKind {
        self.inner.kind()
    }
}
