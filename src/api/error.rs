use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::query::QueryError;
use crate::store::StoreError;

/// Failures surfaced by the read API as `{ "message": ... }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("storage failure")]
    Storage(#[source] StoreError),

    #[error("chart provider failure")]
    Upstream(#[source] anyhow::Error),

    #[error("{0}")]
    Unavailable(&'static str),

    #[error("internal error")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Storage(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Storage(err) => error!(error = %err, "Read API storage failure"),
            ApiError::Upstream(err) => error!(error = ?err, "Chart provider failure"),
            ApiError::Internal(err) => error!(error = %err, "Read API task failure"),
            _ => {}
        }
        (self.status(), Json(ErrorBody { message: self.to_string() })).into_response()
    }
}
