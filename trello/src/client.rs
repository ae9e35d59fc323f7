//! Cliente HTTP para a API REST do Trello (v1)

use crate::error::{Result, TrelloError};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.trello.com/1";

/// Cliente para interagir com a API do Trello
///
/// A autenticação do Trello é feita por query string (`key` + `token`)
/// em todas as requisições, não por header.
#[derive(Clone)]
pub struct TrelloClient {
    http_client: HttpClient,
    api_key: String,
    token: String,
    base_url: String,
}

impl TrelloClient {
    /// Cria um novo cliente Trello
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(api_key, token, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        api_key: impl Into<String>,
        token: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let token = token.into();

        if api_key.trim().is_empty() || token.trim().is_empty() {
            return Err(TrelloError::ConfigError(
                "TRELLO_API_KEY e TRELLO_TOKEN são obrigatórios".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| TrelloError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Substitui a URL base (usado em testes e proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Executa uma requisição GET autenticada
    pub(crate) async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("GET {} params={:?}", url, params);

        let response = self
            .http_client
            .get(&url)
            .query(&[("key", &self.api_key), ("token", &self.token)])
            .query(params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Executa uma requisição GET e parseia JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self.get(endpoint, params).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Executa uma requisição POST autenticada com parâmetros em query string
    pub(crate) async fn post(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        tracing::debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", &self.api_key), ("token", &self.token)])
            .query(params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Executa uma requisição POST e parseia JSON
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self.post(endpoint, params).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!("Trello API error ({}): {}", status_code, error_body);

        // O Trello responde texto puro na maioria dos erros ("invalid key"),
        // mas alguns endpoints devolvem JSON {"message": ..., "error": ...}
        let message = match serde_json::from_str::<Value>(&error_body) {
            Ok(json) => json
                .get("message")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .unwrap_or(&error_body)
                .to_string(),
            Err(_) => error_body,
        };

        Err(TrelloError::ApiError {
            status: status_code,
            message,
        })
    }

    /// Verifica se as credenciais são válidas consultando o usuário autenticado
    pub async fn test_connection(&self) -> Result<()> {
        let _: Value = self
            .get_json("/members/me", &[("fields", "id,username".to_string())])
            .await?;
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
