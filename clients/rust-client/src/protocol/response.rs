use super::error::ServerError;
use serde::{Deserialize, Serialize};

/// Body sent for explicit and implicit statement execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRequest<'a> {
    pub statement: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
}

/// The parts of a Query API response body this client looks at.
///
/// Result data is ignored; only the transaction block and the error list matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryApiResponse {
    #[serde(default)]
    pub transaction: Option<TransactionInfo>,
    #[serde(default)]
    pub errors: Vec<ServerError>,
}

impl QueryApiResponse {
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction.as_ref().and_then(|t| t.id.as_deref())
    }

    pub fn expires(&self) -> Option<&str> {
        self.transaction.as_ref().and_then(|t| t.expires.as_deref())
    }
}
