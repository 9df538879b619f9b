use serde::{Deserialize, Serialize};

/// How one statement execution is wrapped in a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// begin, run, commit: three round trips
    #[default]
    Explicit,
    /// a single call that begins, runs and commits server-side
    Implicit,
}

/// An open explicit transaction.
///
/// Pairs the server-assigned id with the cluster affinity token observed on
/// `begin`. Owned by the task that began it and consumed by `commit`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionContext {
    id: String,
    affinity: Option<String>,
    expires: Option<String>,
}

impl TransactionContext {
    pub fn new(id: impl Into<String>, affinity: Option<String>) -> Self {
        Self {
            id: id.into(),
            affinity: affinity.filter(|a| !a.is_empty()),
            expires: None,
        }
    }

    pub fn with_expires(mut self, expires: Option<String>) -> Self {
        self.expires = expires;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Affinity token to echo on later calls; `None` for non-clustered servers
    pub fn affinity(&self) -> Option<&str> {
        self.affinity.as_deref()
    }

    pub fn expires(&self) -> Option<&str> {
        self.expires.as_deref()
    }
}
