//! Tipos de erro para o crate trello

use thiserror::Error;

/// Erros do cliente Trello
#[derive(Debug, Error)]
pub enum TrelloError {
    /// Erro de requisição HTTP (conexão, timeout de rede, TLS)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resposta não-2xx da API do Trello
    #[error("Trello API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Board, card ou membro não encontrado
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Credenciais ausentes ou cliente mal configurado
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl TrelloError {
    /// Indica se o erro veio de credenciais inválidas (401/403)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, TrelloError::ApiError { status, .. } if *status == 401 || *status == 403)
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, TrelloError>;
