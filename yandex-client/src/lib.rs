//! Yandex Maps API client
//!
//! Thin wrapper over `reqwest` for the two upstream endpoints the proxy
//! forwards to: forward geocoding and address suggestions. Responses are
//! returned as raw decoded JSON; their shape is controlled by Yandex and
//! deliberately not modelled here.

use serde_json::Value;
use shared::ServiceType;

/// Base URL for the geocoding endpoint
const GEOCODE_URL: &str = "https://geocode-maps.yandex.ru/1.x/";

/// Base URL for the suggestion endpoint
const SUGGEST_URL: &str = "https://suggest-maps.yandex.ru/v1/suggest";

/// Fixed number of suggestions requested per query
const SUGGEST_RESULT_LIMIT: u32 = 10;

/// Fixed suggestion locale
const SUGGEST_LANG: &str = "ru_RU";

/// Fixed suggestion result-type filter
const SUGGEST_KIND: &str = "geo";

/// Errors that can occur when calling the upstream service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status
    #[error("{service} error: upstream returned {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The request went out but no response came back
    #[error("{service} error: no response from service")]
    NoResponse { service: &'static str },

    /// The request could not be built or sent, or the body failed to decode
    #[error("{service} error: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    fn from_reqwest(service: ServiceType, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            UpstreamError::NoResponse {
                service: service.label(),
            }
        } else {
            UpstreamError::Request {
                service: service.label(),
                source: err,
            }
        }
    }
}

/// Client for the Yandex geocoding and suggestion endpoints.
///
/// Credentials are not stored here: callers pass the key per operation,
/// having checked its presence first.
#[derive(Clone, Debug)]
pub struct YandexClient {
    client: reqwest::Client,
    geocode_url: String,
    suggest_url: String,
}

impl Default for YandexClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YandexClient {
    /// Create a client pointed at the production endpoints.
    pub fn new() -> Self {
        Self::with_base_urls(GEOCODE_URL, SUGGEST_URL)
    }

    /// Create a client with custom endpoint URLs. Used by tests.
    pub fn with_base_urls(geocode_url: impl Into<String>, suggest_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            geocode_url: geocode_url.into(),
            suggest_url: suggest_url.into(),
        }
    }

    /// Forward-geocode `query`, returning the raw response body.
    pub async fn geocode(&self, api_key: &str, query: &str) -> Result<Value, UpstreamError> {
        self.fetch(
            ServiceType::Geocode,
            &self.geocode_url,
            &[("apikey", api_key), ("geocode", query), ("format", "json")],
        )
        .await
    }

    /// Fetch address suggestions for `query`, returning the raw response body.
    pub async fn suggest(&self, api_key: &str, query: &str) -> Result<Value, UpstreamError> {
        let limit = SUGGEST_RESULT_LIMIT.to_string();
        self.fetch(
            ServiceType::Suggest,
            &self.suggest_url,
            &[
                ("apikey", api_key),
                ("text", query),
                ("type", SUGGEST_KIND),
                ("lang", SUGGEST_LANG),
                ("results", &limit),
            ],
        )
        .await
    }

    async fn fetch(
        &self,
        service: ServiceType,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(service, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Rejected {
                service: service.label(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::from_reqwest(service, e))
    }
}
