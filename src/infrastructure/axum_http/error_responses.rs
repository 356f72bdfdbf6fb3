use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Maps a usecase error onto the shared JSON error body.
pub fn usecase_error_response(status: StatusCode, err: impl std::fmt::Display) -> Response {
    let message = if status.is_server_error() {
        // Don't leak internal error detail to the client
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message,
    });

    (status, body).into_response()
}
