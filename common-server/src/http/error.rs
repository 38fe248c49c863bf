//! Envelope rendering for axum.
//!
//! Success renders `200 {"response": payload}`; a payload that serializes
//! to null renders as `{"response": {"success": true}}`. Failures render with the
//! status from the taxonomy and `{"error": {"code", "message"}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use common_core::{Ack, AppError, ErrorDef, Failure, Outcome, Success};
use common_db::DbError;

/// Taxonomy error as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if err.is_server_error() {
            tracing::error!(
                code = err.code,
                category = %err.category,
                message = %err.message,
                "request failed"
            );
        } else {
            tracing::debug!(code = err.code, category = %err.category, "request rejected");
        }

        (status, Json(Failure::from(&err))).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<ErrorDef> for ApiError {
    fn from(def: ErrorDef) -> Self {
        Self(def.into())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self(e.into())
    }
}

/// Rendered [`Outcome`] of a unit of work.
#[derive(Debug)]
pub struct Reply<T>(pub Outcome<T>);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let payload = match self.0 {
            Ok(payload) => payload,
            Err(err) => return ApiError(err).into_response(),
        };

        match serde_json::to_value(payload) {
            // `()` and `None` would otherwise render `{"response": null}`.
            Ok(Value::Null) => success(serde_json::to_value(Ack::default())),
            Ok(response) => success(Ok(response)),
            Err(err) => ApiError(AppError::unknown(err)).into_response(),
        }
    }
}

fn success(response: serde_json::Result<Value>) -> Response {
    match response {
        Ok(response) => (StatusCode::OK, Json(Success { response })).into_response(),
        Err(err) => ApiError(AppError::unknown(err)).into_response(),
    }
}
