//! Serviço de IA usando async-openai
//!
//! Este crate fornece duas operações sobre transcrições de reuniões:
//! - Resumo estruturado (resumo, pontos-chave, decisões, action items)
//! - Matching de cards do Trello discutidos na reunião
//!
//! A IA é opcional no middleware: quando não configurada ou quando falha,
//! o chamador cai para o matching baseado em regras.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// Caracteres da transcrição enviados no prompt de resumo
pub const SUMMARY_TRANSCRIPT_BUDGET: usize = 12_000;

/// Caracteres da transcrição enviados no prompt de matching
pub const MATCH_TRANSCRIPT_BUDGET: usize = 8_000;

/// Cards enviados no prompt de matching
pub const MAX_CARDS_IN_PROMPT: usize = 80;

/// Erros do serviço de IA
#[derive(Debug)]
pub enum IaServiceError {
    OpenAIError(String),
    ParseError(String),
    ConfigError(String),
}

impl fmt::Display for IaServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IaServiceError::OpenAIError(msg) => write!(f, "OpenAI error: {}", msg),
            IaServiceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            IaServiceError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl Error for IaServiceError {}

pub type IaResult<T> = Result<T, IaServiceError>;

/// Resumo estruturado de uma reunião
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
}

/// Card apresentado à IA para matching
#[derive(Debug, Clone, Serialize)]
pub struct CardContext {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Card que a IA considera discutido na reunião
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCardMatch {
    pub card_id: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct MatchPayload {
    #[serde(default)]
    matches: Vec<AiCardMatch>,
}

/// Configuração do serviço de IA
#[derive(Clone)]
pub struct IaServiceConfig {
    /// API key da OpenAI
    pub api_key: String,
    /// Modelo para chat (padrão: gpt-4o-mini)
    pub chat_model: String,
    /// Temperatura (padrão: 0.2)
    pub temperature: f32,
    /// Max tokens para respostas (padrão: 1200)
    pub max_tokens: u16,
    /// URL base alternativa (proxies compatíveis com OpenAI)
    pub api_base: Option<String>,
}

impl IaServiceConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1200,
            api_base: None,
        }
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u16) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

/// Serviço principal de IA
#[derive(Clone)]
pub struct IaService {
    client: Client<OpenAIConfig>,
    config: IaServiceConfig,
}

impl IaService {
    pub fn new(config: IaServiceConfig) -> IaResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(IaServiceError::ConfigError(
                "OPENAI_API_KEY não configurada".to_string(),
            ));
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base);
        }
        let client = Client::with_config(openai_config);

        tracing::info!("✅ IaService inicializado com modelo: {}", config.chat_model);

        Ok(Self { client, config })
    }

    /// Resume uma transcrição de reunião
    pub async fn summarize_meeting(&self, transcript: &str) -> IaResult<MeetingSummary> {
        tracing::info!("🧠 Gerando resumo da reunião ({} chars)", transcript.len());

        let prompt = build_summary_prompt(transcript);
        let content = self.complete_json(SUMMARY_SYSTEM_PROMPT, &prompt).await?;

        let summary: MeetingSummary = parse_json_payload(&content)?;
        tracing::info!(
            "✅ Resumo gerado: {} pontos-chave, {} decisões, {} action items",
            summary.key_points.len(),
            summary.decisions.len(),
            summary.action_items.len()
        );
        Ok(summary)
    }

    /// Identifica quais cards foram discutidos na transcrição
    ///
    /// IDs que não estão na lista de entrada são descartados e a confiança é
    /// limitada a 0..=100.
    pub async fn match_cards(
        &self,
        transcript: &str,
        cards: &[CardContext],
    ) -> IaResult<Vec<AiCardMatch>> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!("🔍 Matching IA contra {} cards", cards.len());

        let prompt = build_match_prompt(transcript, cards);
        let content = self.complete_json(MATCH_SYSTEM_PROMPT, &prompt).await?;

        let payload: MatchPayload = parse_json_payload(&content)?;
        let matches = sanitize_matches(payload.matches, cards);

        tracing::info!("✅ IA encontrou {} cards", matches.len());
        Ok(matches)
    }

    async fn complete_json(&self, system: &str, user: &str) -> IaResult<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.chat_model)
            .messages(vec![
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system)
                        .build()
                        .map_err(|e| IaServiceError::OpenAIError(format!("Failed to build message: {}", e)))?,
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(user)
                        .build()
                        .map_err(|e| IaServiceError::OpenAIError(format!("Failed to build message: {}", e)))?,
                ),
            ])
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| IaServiceError::OpenAIError(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| IaServiceError::OpenAIError(format!("API call failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| IaServiceError::ParseError("No content in response".to_string()))?;

        tracing::debug!("📋 Response JSON: {}", content);
        Ok(content)
    }

    pub fn get_config(&self) -> &IaServiceConfig {
        &self.config
    }
}

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize internal team meetings. \
Answer only with a JSON object with the keys \"summary\" (string), \"key_points\", \
\"decisions\" and \"action_items\" (arrays of strings).";

const MATCH_SYSTEM_PROMPT: &str = "You match meeting transcripts to Trello cards. \
Answer only with a JSON object {\"matches\": [{\"card_id\": string, \"confidence\": number 0-100, \
\"reason\": string}]}. Only use card ids from the provided list and only include cards \
that were actually discussed.";

/// Monta o prompt de resumo com a transcrição truncada
pub fn build_summary_prompt(transcript: &str) -> String {
    format!(
        "Summarize the following meeting transcript.\n\nTRANSCRIPT:\n{}",
        truncate_chars(transcript, SUMMARY_TRANSCRIPT_BUDGET)
    )
}

/// Monta o prompt de matching listando os cards disponíveis
pub fn build_match_prompt(transcript: &str, cards: &[CardContext]) -> String {
    let card_lines: Vec<String> = cards
        .iter()
        .take(MAX_CARDS_IN_PROMPT)
        .map(|c| {
            let desc = truncate_chars(c.description.trim(), 120);
            if desc.is_empty() {
                format!("- {} | {}", c.id, c.name)
            } else {
                format!("- {} | {} | {}", c.id, c.name, desc)
            }
        })
        .collect();

    format!(
        "CARDS (id | name | description):\n{}\n\nTRANSCRIPT:\n{}",
        card_lines.join("\n"),
        truncate_chars(transcript, MATCH_TRANSCRIPT_BUDGET)
    )
}

/// Trunca em limite de caracteres (não de bytes)
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parseia a resposta JSON do modelo, tolerando blocos ```json
pub fn parse_json_payload<T: serde::de::DeserializeOwned>(content: &str) -> IaResult<T> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    serde_json::from_str(body).map_err(|e| {
        IaServiceError::ParseError(format!("Failed to parse JSON: {}. Content: {}", e, content))
    })
}

/// Mantém apenas IDs conhecidos (sem duplicatas) e limita a confiança a 0..=100
pub fn sanitize_matches(matches: Vec<AiCardMatch>, cards: &[CardContext]) -> Vec<AiCardMatch> {
    let known: HashSet<&str> = cards.iter().map(|c| c.id.as_str()).collect();
    let mut seen = HashSet::new();

    let mut result: Vec<AiCardMatch> = matches
        .into_iter()
        .filter(|m| {
            let ok = known.contains(m.card_id.as_str());
            if !ok {
                tracing::warn!("⚠️ IA retornou card desconhecido: {}", m.card_id);
            }
            ok
        })
        .filter(|m| seen.insert(m.card_id.clone()))
        .map(|mut m| {
            m.confidence = if m.confidence.is_finite() {
                m.confidence.clamp(0.0, 100.0)
            } else {
                0.0
            };
            m
        })
        .collect();

    result.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    result
}
