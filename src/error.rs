//! Errors surfaced by the listing service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ListingError>;

#[derive(Error, Debug)]
pub enum ListingError {
    /// A filter value could not be coerced to its expected type
    #[error("invalid {field} {value:?}: {reason}")]
    Validation {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("accommodation {0} not found")]
    NotFound(i64),

    #[error("data store error: {0}")]
    DataStore(#[from] sqlx::Error),

    /// A stored row holds a value outside the record model
    #[error("malformed listing row: {0}")]
    Mapping(String),
}

impl ListingError {
    pub fn validation(field: &'static str, value: &str, reason: &'static str) -> Self {
        Self::Validation {
            field,
            value: value.to_string(),
            reason,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DataStore(_) | Self::Mapping(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Listing request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
