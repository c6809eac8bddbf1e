use crate::api::responses::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cache_store::StoreError;
use shared::ServiceType;
use yandex_client::UpstreamError;

/// Failures a lookup handler translates into an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The credential for this service is not configured.
    #[error("{} service unavailable", .0.service_name())]
    Unavailable(ServiceType),

    #[error("Query must be at least 3 characters")]
    QueryTooShort,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Cache read/write fault. The client only ever sees a generic 500;
    /// the full error is logged server-side.
    #[error("Internal server error")]
    Storage(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unavailable(_) => {
                tracing::warn!("{self}");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ApiError::QueryTooShort => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Upstream(err) => {
                tracing::error!("upstream call failed: {err}");
                (upstream_status(err), self.to_string())
            }
            ApiError::Storage(err) => {
                tracing::error!("cache store failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn upstream_status(err: &UpstreamError) -> StatusCode {
    match err {
        // Upstream answered: propagate its status.
        UpstreamError::Rejected { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        UpstreamError::NoResponse { .. } | UpstreamError::Request { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rejected_upstream_propagates_status_and_names_service() {
        let err = ApiError::Upstream(UpstreamError::Rejected {
            service: ServiceType::Geocode.label(),
            status: 400,
            body: "invalid request".into(),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("Yandex Geocode"));
        assert!(message.contains("invalid request"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_500() {
        let err = ApiError::Upstream(UpstreamError::NoResponse {
            service: ServiceType::Suggest.label(),
        });

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("no response from service"));
    }

    #[tokio::test]
    async fn storage_errors_are_masked() {
        let err = ApiError::Storage(StoreError::Poisoned);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn missing_credential_is_a_503_with_service_message() {
        let response = ApiError::Unavailable(ServiceType::Geocode).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Geocoding service unavailable");

        let response = ApiError::Unavailable(ServiceType::Suggest).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Suggest service unavailable");
    }
}
