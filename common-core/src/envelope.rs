//! Wire envelopes.
//!
//! Success: `{"response": <payload>}`
//! Failure: `{"error": {"code": <int>, "message": <string>}}`
//!
//! Exactly one of the two keys is present. [`Success`] and [`Failure`] are
//! the server-side shapes; [`Envelope`] decodes either one on the client side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Client-visible part of an [`AppError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub code: i32,
    pub message: String,
}

impl From<&AppError> for ErrorDto {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Success<T> {
    pub response: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub error: ErrorDto,
}

impl From<&AppError> for Failure {
    fn from(err: &AppError) -> Self {
        Self {
            error: ErrorDto::from(err),
        }
    }
}

/// Envelope that broke the one-of-two invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope has neither response nor error")]
    Empty,

    #[error("envelope has both response and error")]
    Ambiguous,
}

/// Either envelope shape, as received from another service.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub response: Option<T>,
    #[serde(default)]
    pub error: Option<ErrorDto>,
}

impl<T> Envelope<T> {
    /// The error carried by the envelope, if any.
    pub fn error_dto(&self) -> Option<&ErrorDto> {
        self.error.as_ref()
    }

    /// Collapse into the payload or the remote error.
    pub fn into_result(self) -> Result<Result<T, ErrorDto>, EnvelopeError> {
        match (self.response, self.error) {
            (Some(response), None) => Ok(Ok(response)),
            (None, Some(error)) => Ok(Err(error)),
            (Some(_), Some(_)) => Err(EnvelopeError::Ambiguous),
            (None, None) => Err(EnvelopeError::Empty),
        }
    }
}
