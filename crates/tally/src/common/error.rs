use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single line of a weight/quota table that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRecord {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
    pub reason: String,
}

impl Display for MalformedRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {} (`{}`)", self.line, self.reason, self.content)
    }
}

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Cannot read configuration table {path}: {message}")]
    Configuration { path: PathBuf, message: String },
    #[error("Accounting backend unavailable: {0}")]
    BackendUnavailable(String),
}
