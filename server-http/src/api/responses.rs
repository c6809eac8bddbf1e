use serde::Serialize;
use serde_json::Value;

/// Where a query result came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Yandex,
}

/// Envelope returned by both lookup endpoints.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub result: Value,
    pub source: Source,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
