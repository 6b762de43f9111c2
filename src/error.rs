use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for the coachway engine.
///
/// Domain modules ([`crate::revenue::RevenueError`],
/// [`crate::scheduling::SchedulingError`]) carry richer variants and convert
/// into this type at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum CoachwayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Idempotency conflicts: the work was already done. Distinguishable
    /// from real failures so callers can treat a replay as a no-op.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    error_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl CoachwayError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Anyhow(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to return to clients in production.
    ///
    /// Client errors (4xx) expose their message; server errors (5xx) are
    /// replaced with a generic message and the detail stays in the logs.
    fn safe_message(&self) -> String {
        match self {
            Self::NotFound(msg) => format!("Not found: {}", msg),
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::Unauthorized(msg) => format!("Unauthorized: {}", msg),
            Self::Forbidden(msg) => format!("Forbidden: {}", msg),
            Self::Conflict(msg) => format!("Conflict: {}", msg),

            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            Self::ServiceUnavailable(_) => "Service unavailable".to_string(),
            Self::Database(_) => "Database error".to_string(),
        }
    }
}

impl IntoResponse for CoachwayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        // Full error goes to the server log, never to the client.
        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Request failed"
        );

        let body = Json(ErrorResponse {
            error: self.safe_message(),
            error_id,
            details: None,
        });

        (status, body).into_response()
    }
}

/// Result type alias for coachway operations.
pub type Result<T> = std::result::Result<T, CoachwayError>;

impl From<serde_json::Error> for CoachwayError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CoachwayError::BadRequest(format!("JSON error: {}", err))
        } else {
            CoachwayError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<reqwest::Error> for CoachwayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CoachwayError::ServiceUnavailable(format!("Upstream timeout: {}", err))
        } else if err.is_connect() {
            CoachwayError::ServiceUnavailable(format!("Connection error: {}", err))
        } else if err.is_status() {
            match err.status().map(|s| s.as_u16()) {
                Some(401) => CoachwayError::Unauthorized("Upstream authentication failed".to_string()),
                Some(403) => CoachwayError::Forbidden("Upstream access denied".to_string()),
                Some(404) => CoachwayError::NotFound("Upstream resource not found".to_string()),
                Some(503) => CoachwayError::ServiceUnavailable("Upstream service unavailable".to_string()),
                _ => CoachwayError::Internal(format!("Upstream error: {}", err)),
            }
        } else {
            CoachwayError::Internal(format!("Request error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_constructors() {
        let err = CoachwayError::not_found("Session not found");
        assert!(matches!(err, CoachwayError::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: Session not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = CoachwayError::conflict("Revenue already calculated");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Conflict: Revenue already calculated");

        let err = CoachwayError::bad_request("sessionId required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_safe_message_hides_server_errors() {
        assert_eq!(
            CoachwayError::internal("db password is 'hunter2'").safe_message(),
            "Internal server error"
        );
        assert_eq!(
            CoachwayError::database("relation coach_payouts does not exist").safe_message(),
            "Database error"
        );
        assert_eq!(
            CoachwayError::service_unavailable("calendar at 10.0.0.3 unreachable").safe_message(),
            "Service unavailable"
        );
    }

    #[test]
    fn test_safe_message_exposes_client_errors() {
        assert_eq!(
            CoachwayError::conflict("already calculated").safe_message(),
            "Conflict: already calculated"
        );
        assert_eq!(
            CoachwayError::bad_request("newDate required").safe_message(),
            "Bad request: newDate required"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ not json }");
        let err: CoachwayError = result.unwrap_err().into();
        assert!(matches!(err, CoachwayError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_into_response_status() {
        let response = CoachwayError::not_found("Enrollment").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = CoachwayError::conflict("duplicate").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_response_body_hides_internal_details() {
        let response = CoachwayError::internal("secret detail").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Internal server error");
        assert!(json["error_id"].as_str().is_some());
    }
}
