//! Error responses shared by every HTTP endpoint.
//!
//! Each layer keeps its own `thiserror` enum and implements
//! [`IntoErrorResponse`] to map variants onto a status code, a
//! machine-readable code and the common JSON body.
use serde::{Deserialize, Serialize};
use std::fmt;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Standard error body for all API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "game_not_found")
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn into_response(self, status: StatusCode) -> Response {
        reply::with_status(reply::json(&self), status).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Client errors (4xx), part of normal operation
    Client,
    /// Server errors (5xx)
    Server,
    /// Broken internal invariant, e.g. a poisoned lock or an exhausted deck
    Critical,
}

/// Converts an error into an HTTP response, logging it by severity.
pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;

    fn error_code(&self) -> &'static str;

    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity {
        if self.status_code().is_server_error() {
            ErrorSeverity::Server
        } else {
            ErrorSeverity::Client
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    fn into_http_response(self) -> Response
    where
        Self: Sized,
    {
        let status = self.status_code();
        let severity = self.severity();
        let error_response = self.to_error_response();
        log_error(severity, &error_response);
        error_response.into_response(status)
    }
}

pub(crate) fn log_error(severity: ErrorSeverity, error: &ErrorResponse) {
    match severity {
        ErrorSeverity::Client => {
            tracing::info!(error = %error.error, message = %error.message, "client error")
        }
        ErrorSeverity::Server => {
            tracing::error!(error = %error.error, message = %error.message, "server error")
        }
        ErrorSeverity::Critical => {
            tracing::error!(
                error = %error.error,
                message = %error.message,
                critical = true,
                "critical error"
            )
        }
    }
}
