//! Error types for the rendezvous server

use thiserror::Error;

/// Errors that can occur while serving signaling requests
#[derive(Error, Debug)]
pub enum SignalingError {
    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the state snapshot failed
    #[error("State file error: {0}")]
    StateFile(#[from] std::io::Error),

    /// Request method is not served on this path
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(http::Method),

    /// No route for this path
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SignalingError {
    /// HTTP status reported for this error
    pub fn status(&self) -> http::StatusCode {
        match self {
            SignalingError::MethodNotAllowed(_) => http::StatusCode::METHOD_NOT_ALLOWED,
            SignalingError::NotFound(_) => http::StatusCode::NOT_FOUND,
            SignalingError::Json(_) | SignalingError::StateFile(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
