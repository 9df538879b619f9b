use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    Connect,
    Timeout,
    Other,
}

impl std::fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionFailure::Connect => write!(f, "connection failed"),
            ConnectionFailure::Timeout => write!(f, "connection timed out"),
            ConnectionFailure::Other => write!(f, "connection error"),
        }
    }
}

/// Known Query API error codes.
///
/// Anything not listed is kept verbatim in [`ErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseNotFound,
    Unauthorized,
    InvalidRequest,
    ResourceExhaustion,
    AuthenticationRateLimit,
    Other(String),
}

impl ErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "Neo.ClientError.Database.DatabaseNotFound" => ErrorCode::DatabaseNotFound,
            "Neo.ClientError.Security.Unauthorized" => ErrorCode::Unauthorized,
            "Neo.ClientError.Request.Invalid" => ErrorCode::InvalidRequest,
            "Neo.TransientError.Request.ResourceExhaustion" => ErrorCode::ResourceExhaustion,
            "Neo.ClientError.Security.AuthenticationRateLimit" => {
                ErrorCode::AuthenticationRateLimit
            }
            other => ErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::DatabaseNotFound => "Neo.ClientError.Database.DatabaseNotFound",
            ErrorCode::Unauthorized => "Neo.ClientError.Security.Unauthorized",
            ErrorCode::InvalidRequest => "Neo.ClientError.Request.Invalid",
            ErrorCode::ResourceExhaustion => "Neo.TransientError.Request.ResourceExhaustion",
            ErrorCode::AuthenticationRateLimit => "Neo.ClientError.Security.AuthenticationRateLimit",
            ErrorCode::Other(code) => code,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseNotFound => "database not found",
            ErrorCode::Unauthorized => "authentication failed",
            ErrorCode::InvalidRequest => "malformed request",
            ErrorCode::ResourceExhaustion => "server resources exhausted",
            ErrorCode::AuthenticationRateLimit => "too many authentication attempts",
            ErrorCode::Other(_) => "error from Query API",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::parse(&code))
    }
}

/// One entry of the `errors` array in a Query API response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    pub code: ErrorCode,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.code.description(),
            self.code.as_str(),
            self.message
        )
    }
}

#[derive(Error, Debug)]
pub enum QueryApiError {
    #[error("Connection error calling {url}: {kind}: {message}")]
    Connection {
        url: String,
        kind: ConnectionFailure,
        message: String,
    },

    #[error("Query API returned errors from {url}: {}", format_errors(.errors))]
    Protocol { url: String, errors: Vec<ServerError> },

    #[error("HTTP {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Transport already closed")]
    TransportClosed,

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

fn format_errors(errors: &[ServerError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl QueryApiError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ConnectionFailure::Timeout
        } else if err.is_connect() {
            ConnectionFailure::Connect
        } else {
            ConnectionFailure::Other
        };
        QueryApiError::Connection {
            url: url.to_string(),
            kind,
            message: err.to_string(),
        }
    }

    /// First error code reported by the server, if this is a protocol error
    pub fn error_code(&self) -> Option<&ErrorCode> {
        match self {
            QueryApiError::Protocol { errors, .. } => errors.first().map(|e| &e.code),
            _ => None,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, QueryApiError::Connection { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, QueryApiError::Protocol { .. })
    }
}
