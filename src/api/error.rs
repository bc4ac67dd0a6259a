//! API error types with structured JSON responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::clinic_state::ClinicError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    /// Whether the client may send the same request again.
    pub retryable: bool,
}

/// Seconds a client should wait before retrying a contended write.
const RETRY_AFTER_SECS: u64 = 1;

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Clinic(#[from] ClinicError),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Clinic(err) => {
                let status = match err {
                    ClinicError::Validation(_) | ClinicError::InvalidCheckin(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ClinicError::NotFound(_)
                    | ClinicError::AppointmentNotFound(_)
                    | ClinicError::PatientNotFound(_) => StatusCode::NOT_FOUND,
                    ClinicError::InvalidTransition { .. }
                    | ClinicError::AlreadyFinalized { .. }
                    | ClinicError::DepartmentUnavailable(_) => StatusCode::CONFLICT,
                    ClinicError::TemporarilyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    ClinicError::LockPoisoned
                    | ClinicError::Database(_)
                    | ClinicError::Config(_)
                    | ClinicError::Io(_) => {
                        tracing::error!(error = %err, "API internal error");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "INTERNAL",
                            "An internal error occurred".to_string(),
                        );
                    }
                };
                (status, err.code(), err.to_string())
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Clinic(e) if e.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let retryable = self.is_retryable();

        let body = ErrorBody {
            status: "error",
            error: ErrorDetail {
                code,
                message,
                retryable,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if retryable {
            if let Ok(val) = axum::http::HeaderValue::from_str(&RETRY_AFTER_SECS.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<crate::db::DatabaseError> for ApiError {
    fn from(err: crate::db::DatabaseError) -> Self {
        ApiError::Clinic(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    use crate::models::{AppointmentStatus, Department};

    async fn json_of(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn validation_returns_400_not_retryable() {
        let response = ApiError::from(ClinicError::Validation("bad mobile".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("Retry-After").is_none());
        let json = json_of(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["retryable"], false);
    }

    #[tokio::test]
    async fn temporarily_unavailable_returns_503_with_retry_after() {
        let response =
            ApiError::from(ClinicError::TemporarilyUnavailable("busy".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "1");
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "TEMPORARILY_UNAVAILABLE");
        assert_eq!(json["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn already_finalized_returns_409() {
        let err = ClinicError::AlreadyFinalized {
            id: 3,
            status: AppointmentStatus::Completed,
        };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "ALREADY_FINALIZED");
    }

    #[tokio::test]
    async fn unavailable_department_returns_409() {
        let response =
            ApiError::from(ClinicError::DepartmentUnavailable(Department::Dental)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn not_found_variants_return_404() {
        for err in [
            ClinicError::AppointmentNotFound(9),
            ClinicError::PatientNotFound("9000000001".into()),
            ClinicError::NotFound("Doctor 4".into()),
        ] {
            assert_eq!(ApiError::from(err).into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let err = ClinicError::Database(crate::db::DatabaseError::ConstraintViolation(
            "secret table".into(),
        ));
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let response = ApiError::BadRequest("Invalid ID format".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
