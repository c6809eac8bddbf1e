use serde::Deserialize;

/// Query-string parameters of the two lookup endpoints.
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub query: Option<String>,
}
