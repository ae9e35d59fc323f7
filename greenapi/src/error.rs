//! Tipos de erro para o crate greenapi

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GreenApiError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resposta não-2xx da Green API
    #[error("Green API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Instância ou token ausentes
    #[error("Green API not configured: {0}")]
    NotConfigured(String),

    /// Chat ID vazio ou inválido
    #[error("Invalid chat id: '{0}'")]
    InvalidChatId(String),
}

impl GreenApiError {
    /// Erros transitórios (rede, 5xx, 429) podem ser repetidos
    pub fn is_retryable(&self) -> bool {
        match self {
            GreenApiError::HttpError(_) => true,
            GreenApiError::ApiError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GreenApiError>;
