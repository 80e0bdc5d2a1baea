use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid list price: {0}")]
    InvalidPrice(String),

    #[error("Invalid signing token")]
    InvalidToken,

    #[error("Signing token expired")]
    TokenExpired,

    #[error("Section already signed for this role")]
    AlreadySigned,

    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("Upstream fetch failed with status {status}")]
    UpstreamFetch { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
            AppError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                "MISSING_PARAMETER",
                format!("Missing required parameter: {}", name),
            ),
            AppError::InvalidPrice(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_PRICE", msg.clone())
            }
            AppError::InvalidToken => (
                StatusCode::BAD_REQUEST,
                "INVALID_TOKEN",
                "Signing token not found".to_string(),
            ),
            AppError::TokenExpired => (
                StatusCode::BAD_REQUEST,
                "TOKEN_EXPIRED",
                "Signing token has expired".to_string(),
            ),
            AppError::AlreadySigned => (
                StatusCode::BAD_REQUEST,
                "ALREADY_SIGNED",
                "This section already has a signature for that role".to_string(),
            ),
            AppError::UpstreamAuth(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_AUTH_ERROR",
                msg.clone(),
            ),
            // Relay the upstream status and body so callers can diagnose
            // their own filter/query.
            AppError::UpstreamFetch { status, body } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_FETCH_ERROR",
                body.clone(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_fetch_relays_status_and_body() {
        let err = AppError::UpstreamFetch {
            status: 422,
            body: "invalid $filter".to_string(),
        };
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "UPSTREAM_FETCH_ERROR");
        assert_eq!(message, "invalid $filter");
    }

    #[test]
    fn upstream_auth_maps_to_internal_server_error() {
        let err = AppError::UpstreamAuth("token endpoint returned 401".to_string());
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "UPSTREAM_AUTH_ERROR");
    }

    #[test]
    fn signing_errors_map_to_bad_request() {
        for err in [
            AppError::InvalidToken,
            AppError::TokenExpired,
            AppError::AlreadySigned,
            AppError::MissingParameter("resource"),
        ] {
            let (status, _, _) = err.parts();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
}
