/// Unified error types for the marketplace admin service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the admin service
#[derive(Error, Debug)]
pub enum AdminError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., dispute already closed)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream service could not be reached (connect failure or timeout)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Upstream service answered with a non-success status
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Generic upstream failure answered with 400 Bad Request
    pub fn upstream_rejected(message: impl Into<String>) -> Self {
        AdminError::Upstream {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Generic upstream failure answered with 502 Bad Gateway
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        AdminError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AdminError::Authorization(_) => StatusCode::FORBIDDEN,
            AdminError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::Conflict(_) => StatusCode::CONFLICT,
            AdminError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AdminError::Upstream { status, .. } => *status,
            AdminError::Database(_) | AdminError::Internal(_) | AdminError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut field_errors: Vec<(String, &Vec<validator::ValidationError>)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| (field.to_string(), errors))
            .collect();
        field_errors.sort_by(|a, b| a.0.cmp(&b.0));

        // Rules carrying a message speak for themselves
        let mut messages: Vec<String> = Vec::new();
        for (_, errors) in &field_errors {
            for error in errors.iter() {
                if let Some(message) = &error.message {
                    if !messages.iter().any(|m| m == message) {
                        messages.push(message.to_string());
                    }
                }
            }
        }

        let fields: Vec<&str> = field_errors.iter().map(|(field, _)| field.as_str()).collect();

        if messages.is_empty() {
            AdminError::Validation(format!("Invalid fields: {}", fields.join(", ")))
        } else {
            AdminError::Validation(messages.join("; "))
        }
    }
}

/// JSON error body returned to callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert AdminError to HTTP response
impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, message) = match &self {
            AdminError::Authentication(_) => ("AuthenticationRequired", self.to_string()),
            AdminError::Authorization(_) => ("Forbidden", self.to_string()),
            AdminError::Validation(_) => ("InvalidRequest", self.to_string()),
            AdminError::NotFound(_) => ("NotFound", self.to_string()),
            AdminError::Conflict(_) => ("Conflict", self.to_string()),
            AdminError::ServiceUnavailable(_) => ("ServiceUnavailable", self.to_string()),
            AdminError::Upstream { .. } => ("UpstreamFailure", self.to_string()),
            AdminError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ("InternalServerError", "Internal server error".to_string())
            }
            AdminError::Internal(_) | AdminError::Io(_) => {
                tracing::error!(error = %self, "internal error");
                ("InternalServerError", "Internal server error".to_string()) // Don't leak details
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for admin service operations
pub type AdminResult<T> = Result<T, AdminError>;
