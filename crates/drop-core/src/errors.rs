//! Application error taxonomy and its HTTP mapping.
//!
//! Handlers and inner middleware return [`AppError`] by value. Converting an
//! error into a response does **not** pick the client-visible status or body:
//! [`AppError::into_response`] only attaches the error to the response through
//! an [`ErrorCarrier`] extension. The error-translation middleware removes the
//! carrier, logs the failure and renders the final response with
//! [`AppError::to_response`].
//!
//! | Kind | Status |
//! |------|--------|
//! | [`AppError::AuthenticationFailed`] | 401 |
//! | [`AppError::Forbidden`] | 403 |
//! | [`AppError::InvalidId`], [`AppError::RequestValidation`] | 400 |
//! | [`AppError::NotFound`] | 404 |
//! | everything else | 500 |

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// JSON body returned to clients for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, expired or unverifiable credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Authenticated, but lacking the required role or ownership.
    #[error("attempted action is not allowed")]
    Forbidden,

    #[error("ID is not in its proper form")]
    InvalidId,

    #[error("{message}")]
    RequestValidation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("not found")]
    NotFound,

    /// A typed request-context accessor found nothing to return. This is a
    /// wiring defect (a stage ran without the stage it depends on).
    #[error("{0} missing from request context")]
    ContextMissing(&'static str),

    /// The process must drain and stop.
    #[error("shutdown requested: {0}")]
    Shutdown(String),

    #[error(transparent)]
    Unrecognized(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::RequestValidation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn validation_fields(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::RequestValidation {
            message: message.into(),
            fields,
        }
    }

    pub fn shutdown(reason: impl Into<String>) -> Self {
        Self::Shutdown(reason.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidId | AppError::RequestValidation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ContextMissing(_) | AppError::Shutdown(_) | AppError::Unrecognized(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, AppError::Shutdown(_))
    }

    /// Whether the error belongs to the closed set of client-facing kinds.
    /// Anything else is reported to the client as a bare 500.
    pub fn is_trusted(&self) -> bool {
        !matches!(
            self,
            AppError::ContextMissing(_) | AppError::Shutdown(_) | AppError::Unrecognized(_)
        )
    }

    /// Client-facing body. Internal detail never leaves the process.
    pub fn body(&self) -> ErrorResponse {
        if !self.is_trusted() {
            return ErrorResponse {
                error: StatusCode::INTERNAL_SERVER_ERROR
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_string(),
                fields: Vec::new(),
            };
        }

        let fields = match self {
            AppError::RequestValidation { fields, .. } => fields.clone(),
            _ => Vec::new(),
        };

        ErrorResponse {
            error: self.to_string(),
            fields,
        }
    }

    /// Renders the final response for this error.
    pub fn to_response(&self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Carries an [`AppError`] from the handler back out to the translation stage.
#[derive(Debug, Clone)]
pub struct ErrorCarrier(Arc<AppError>);

impl ErrorCarrier {
    pub fn new(err: AppError) -> Self {
        Self(Arc::new(err))
    }

    pub fn error(&self) -> &AppError {
        &self.0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(ErrorCarrier(Arc::new(self)));
        response
    }
}
