//! Error type shared by services and HTTP handlers

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Serialization error: {0}")]
  Json(#[from] json::Error),

  #[error("Upstream request failed: {0}")]
  Upstream(#[from] reqwest::Error),

  #[error("{0}")]
  NotFound(&'static str),

  #[error("Please login (10001)")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(&'static str),

  #[error("{0}")]
  InvalidArgs(String),

  /// Feature is available only for pro or trial tiers.
  #[error("{0}")]
  Premium(String),

  #[error("{0}")]
  Rejected(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::Database(_) | Error::Json(_) | Error::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::Upstream(_) => StatusCode::BAD_GATEWAY,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) | Error::Premium(_) => StatusCode::FORBIDDEN,
      Error::InvalidArgs(_) | Error::Rejected(_) => StatusCode::BAD_REQUEST,
    }
  }

  /// Message safe to show to a client or a bot admin.
  pub fn user_message(&self) -> String {
    match self {
      Error::Database(_) => "Database error".into(),
      Error::Json(_) | Error::Internal(_) => "Internal error".into(),
      Error::Upstream(_) => "Upstream service unavailable".into(),
      other => other.to_string(),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!("Request failed: {self}");
    }

    let body = json::json!({
      "success": false,
      "error": self.user_message(),
    });

    (status, Json(body)).into_response()
  }
}
