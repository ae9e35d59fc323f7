//! Cliente HTTP para a Green API (relay WhatsApp)

use crate::error::{GreenApiError, Result};
use crate::types::{SendMessageRequest, SendMessageResponse, StateInstance};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.green-api.com";

/// Tentativas totais em `send_with_retry`
const MAX_RETRIES: u32 = 3;

/// Backoff inicial (dobra a cada tentativa)
const INITIAL_BACKOFF_MS: u64 = 100;

/// Normaliza um identificador de chat do WhatsApp
///
/// IDs que já terminam em `@c.us` (contato) ou `@g.us` (grupo) são mantidos.
/// Números de telefone têm tudo que não é dígito removido e recebem `@c.us`.
///
/// ```
/// use greenapi::normalize_chat_id;
///
/// assert_eq!(normalize_chat_id("+237 650-123-456").unwrap(), "237650123456@c.us");
/// assert_eq!(normalize_chat_id("120363@g.us").unwrap(), "120363@g.us");
/// assert!(normalize_chat_id("  ").is_err());
/// ```
pub fn normalize_chat_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.ends_with("@c.us") || trimmed.ends_with("@g.us") {
        return Ok(trimmed.to_string());
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(GreenApiError::InvalidChatId(raw.to_string()));
    }
    Ok(format!("{}@c.us", digits))
}

/// Cliente para uma instância da Green API
///
/// As rotas seguem o formato `{base}/waInstance{id}/{método}/{token}`.
#[derive(Clone)]
pub struct GreenApiClient {
    http_client: HttpClient,
    instance_id: String,
    token: String,
    base_url: String,
}

impl GreenApiClient {
    pub fn new(instance_id: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let instance_id = instance_id.into();
        let token = token.into();

        if instance_id.trim().is_empty() || token.trim().is_empty() {
            return Err(GreenApiError::NotConfigured(
                "GREEN_API_INSTANCE e GREEN_API_TOKEN são obrigatórios".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| GreenApiError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            instance_id,
            token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/waInstance{}/{}/{}",
            self.base_url, self.instance_id, method, self.token
        )
    }

    /// Envia uma mensagem de texto (uma tentativa)
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<SendMessageResponse> {
        let chat_id = normalize_chat_id(chat_id)?;
        let body = SendMessageRequest {
            chat_id: &chat_id,
            message: text,
        };

        tracing::debug!("POST sendMessage chat_id={} ({} chars)", chat_id, text.len());

        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let sent: SendMessageResponse = self.parse(response).await?;
        tracing::info!("📱 Mensagem enviada para {} (id {})", chat_id, sent.id_message);
        Ok(sent)
    }

    /// Envia uma mensagem com retry e backoff exponencial
    ///
    /// Erros 4xx (exceto 429) não são repetidos.
    pub async fn send_with_retry(&self, chat_id: &str, text: &str) -> Result<SendMessageResponse> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut attempt = 1;

        loop {
            match self.send_message(chat_id, text).await {
                Ok(sent) => return Ok(sent),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    tracing::warn!(
                        "⚠️ Falha ao enviar WhatsApp (tentativa {}/{}): {}. Retry em {}ms",
                        attempt,
                        MAX_RETRIES,
                        e,
                        backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Estado da instância (`authorized`, `notAuthorized`, `blocked`, ...)
    pub async fn get_state_instance(&self) -> Result<StateInstance> {
        let response = self
            .http_client
            .get(self.method_url("getStateInstance"))
            .send()
            .await?;
        self.parse(response).await
    }

    pub async fn is_authorized(&self) -> Result<bool> {
        Ok(self.get_state_instance().await?.is_authorized())
    }

    async fn parse<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Green API error ({}): {}", status.as_u16(), body);
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| {
                    json.get("message")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or(body);
            return Err(GreenApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
