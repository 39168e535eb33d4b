use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Message returned for every request body that cannot be read as a multipart form.
pub const FORM_PARSE_ERROR: &str = "Unable to parse form data";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data (malformed or oversized multipart body, unusable key header)
    #[error("{message}")]
    BadRequest { message: String },

    /// The storage backend rejected the write or could not be reached
    #[error("Unable to upload file to S3: {0}")]
    Upstream(#[from] StorageError),

    /// Configuration failed validation at startup
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// The error returned for any multipart parsing failure
    pub fn unparseable_form() -> Self {
        Error::BadRequest {
            message: FORM_PARSE_ERROR.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Upstream(_) | Error::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to the client.
    ///
    /// Storage failures forward the backend's error text; configuration problems do not leak
    /// into responses.
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::Upstream(_) => self.to_string(),
            Error::InvalidConfig { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::InvalidConfig { .. } => {
                tracing::error!("Internal service error: {}", self);
            }
            Error::Upstream(_) => {
                tracing::warn!("Storage backend error: {}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
