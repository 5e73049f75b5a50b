use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use supercookie_core::SupercookieError;
use thiserror::Error;

/// Failures local to one request. None of them affect other requests.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Missing probe index")]
    MalformedProbe,

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] SupercookieError),
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::MalformedProbe => StatusCode::BAD_REQUEST,
            RouteError::AssetNotFound(_) | RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
