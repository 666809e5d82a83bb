//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] tracer_core::Error),

  #[error("file storage error: {0}")]
  Io(#[from] std::io::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use tracer_core::Error as E;
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        E::NotFound(_) => StatusCode::NOT_FOUND,
        E::Forbidden(_) => StatusCode::FORBIDDEN,
        E::Validation(_) => StatusCode::BAD_REQUEST,
        E::InvalidState(_) | E::Conflict(_) => StatusCode::CONFLICT,
        E::Timeout => StatusCode::GATEWAY_TIMEOUT,
        E::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Text for the response body. Storage and filesystem details stay in
  /// the log.
  fn public_message(&self) -> String {
    match self {
      ApiError::Io(_) | ApiError::Core(tracer_core::Error::Store(_)) => {
        "internal server error".to_owned()
      }
      e => e.to_string(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.public_message() }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"tracer\""));
    }
    res
  }
}
