use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    TrelloApi(String),
    WhatsApp(String),
    Ai(String),
    GoogleDocs(String),
    Storage(String),
    ConfigError(String),
    JsonError(serde_json::Error),
    HttpError(reqwest::Error),
    ValidationError(String),
    NotFound(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::TrelloApi(msg) => write!(f, "Trello API error: {}", msg),
            AppError::WhatsApp(msg) => write!(f, "WhatsApp error: {}", msg),
            AppError::Ai(msg) => write!(f, "AI error: {}", msg),
            AppError::GoogleDocs(msg) => write!(f, "Google Docs error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::HttpError(err) => write!(f, "HTTP error: {}", err),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<trello::TrelloError> for AppError {
    fn from(err: trello::TrelloError) -> Self {
        match err {
            trello::TrelloError::NotFound(msg) => AppError::NotFound(msg),
            trello::TrelloError::ValidationError(msg) => AppError::ValidationError(msg),
            trello::TrelloError::ConfigError(msg) => AppError::ConfigError(msg),
            other => AppError::TrelloApi(other.to_string()),
        }
    }
}

impl From<greenapi::GreenApiError> for AppError {
    fn from(err: greenapi::GreenApiError) -> Self {
        match err {
            greenapi::GreenApiError::InvalidChatId(id) => {
                AppError::ValidationError(format!("Invalid WhatsApp chat id: '{}'", id))
            }
            other => AppError::WhatsApp(other.to_string()),
        }
    }
}

impl From<ia_service::IaServiceError> for AppError {
    fn from(err: ia_service::IaServiceError) -> Self {
        AppError::Ai(err.to_string())
    }
}

impl From<crate::services::reminder_tracker::TrackerError> for AppError {
    fn from(err: crate::services::reminder_tracker::TrackerError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::TrelloApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::WhatsApp(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Ai(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::GoogleDocs(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::JsonError(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::HttpError(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (AppError::TrelloApi("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::WhatsApp("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_trello_not_found_maps_to_404() {
        let err: AppError = trello::TrelloError::NotFound("board".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = trello::TrelloError::ApiError {
            status: 401,
            message: "invalid key".into(),
        }
        .into();
        assert!(matches!(err, AppError::TrelloApi(_)));
    }

    #[test]
    fn test_invalid_chat_id_is_validation_error() {
        let err: AppError = greenapi::GreenApiError::InvalidChatId("".into()).into();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
