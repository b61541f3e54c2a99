//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Ai(#[from] grocer_ai::Error),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }
}

impl From<grocer_core::Error> for ApiError {
  fn from(e: grocer_core::Error) -> Self {
    use grocer_core::Error as E;
    match e {
      E::ItemNotFound(_) | E::CategoryNotFound(_) | E::SetNotFound(_) => {
        ApiError::NotFound(e.to_string())
      }
      E::ReservedCategory | E::DuplicateName(_) | E::EmptyName => {
        ApiError::BadRequest(e.to_string())
      }
      E::Serialization(_) => ApiError::store(e),
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self { ApiError::store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
      ApiError::Ai(e) => {
        let status = match e {
          grocer_ai::Error::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
          e if e.is_rate_limited() => StatusCode::SERVICE_UNAVAILABLE,
          _ => StatusCode::BAD_GATEWAY,
        };
        (status, e.user_message())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
