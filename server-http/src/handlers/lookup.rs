use crate::api::requests::LookupParams;
use crate::api::responses::{QueryResponse, Source};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_query;
use axum::extract::{Query, State};
use axum::Json;
use serde_json::Value;
use shared::ServiceType;
use tracing::info;

/// GET /geocode?query=...
pub async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Some(api_key) = state.config.geocoding_api_key.as_deref() else {
        return Err(ApiError::Unavailable(ServiceType::Geocode));
    };
    let query = validate_query(params.query.as_deref())?;
    info!("GEOCODE: query={query}");

    if let Some(cached) = cache_lookup(&state, &query, ServiceType::Geocode).await? {
        return Ok(Json(QueryResponse {
            result: cached,
            source: Source::Cache,
        }));
    }

    let result = state.yandex.geocode(api_key, &query).await?;
    cache_insert(&state, &query, ServiceType::Geocode, &result).await?;

    Ok(Json(QueryResponse {
        result,
        source: Source::Yandex,
    }))
}

/// GET /suggest?query=...
pub async fn suggest(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Some(api_key) = state.config.suggest_api_key.as_deref() else {
        return Err(ApiError::Unavailable(ServiceType::Suggest));
    };
    let query = validate_query(params.query.as_deref())?;
    info!("SUGGEST: query={query}");

    if let Some(cached) = cache_lookup(&state, &query, ServiceType::Suggest).await? {
        return Ok(Json(QueryResponse {
            result: cached,
            source: Source::Cache,
        }));
    }

    let result = state.yandex.suggest(api_key, &query).await?;
    cache_insert(&state, &query, ServiceType::Suggest, &result).await?;

    Ok(Json(QueryResponse {
        result,
        source: Source::Yandex,
    }))
}

/// Treats a missing store (degraded startup) as a permanent miss.
async fn cache_lookup(
    state: &AppState,
    query: &str,
    service: ServiceType,
) -> Result<Option<Value>, ApiError> {
    match &state.store {
        Some(store) => Ok(store.lookup(query, service).await?),
        None => Ok(None),
    }
}

/// First-write-wins: a concurrent request may have stored this key already,
/// in which case the insert reports `false` and the fresh result is still
/// returned to the client.
async fn cache_insert(
    state: &AppState,
    query: &str,
    service: ServiceType,
    result: &Value,
) -> Result<(), ApiError> {
    if let Some(store) = &state.store {
        store.insert_if_absent(query, service, result).await?;
    }
    Ok(())
}
