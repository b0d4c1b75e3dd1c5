use thiserror::Error;
use tracing::error;

use ferrite_filter::{FilterError, JobError};

use crate::routes::{error_response, HttpResponse};

/// Generic message for failures the client cannot act on.
pub const INTERNAL_MESSAGE: &str = "An error occurred while processing the file.";

/// Failure of a request handler, mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
    #[error("{0}")]
    NotFound(String),
    /// `public` goes to the client, `detail` only to the log.
    #[error("{public}")]
    Internal { public: String, detail: String },
}

impl ApiError {
    pub fn internal(detail: impl ToString) -> Self {
        ApiError::Internal { public: INTERNAL_MESSAGE.into(), detail: detail.to_string() }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unprocessable(_) => 422,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::NotFound(_) => 404,
            ApiError::Internal { .. } => 500,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        if let ApiError::Internal { detail, .. } = &self {
            error!(%detail, "request failed");
        }
        error_response(self.status(), &self.to_string())
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        match e {
            FilterError::InvalidParameter(_) => ApiError::Unprocessable(e.to_string()),
            FilterError::UnknownLabel { .. } => ApiError::internal(e),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::Filter(inner) => inner.into(),
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            e => ApiError::internal(e),
        }
    }
}
