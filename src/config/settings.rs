use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub trello: TrelloSettings,
    #[serde(default)]
    pub green_api: GreenApiSettings,
    #[serde(default)]
    pub google_docs: GoogleDocsSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub meeting: MeetingSettings,
    #[serde(default)]
    pub team: TeamSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub admin_api_key: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            admin_api_key: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TrelloSettings {
    pub api_key: String,
    pub token: String,
    /// Fragmento do nome do board de trabalho
    pub board_name: String,
    /// ID explícito do board (tem prioridade sobre o nome)
    pub board_id: Option<String>,
    pub base_url: String,
}

impl Default for TrelloSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            token: String::new(),
            board_name: "eeinteractive".to_string(),
            board_id: None,
            base_url: "https://api.trello.com/1".to_string(),
        }
    }
}

impl TrelloSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.token.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GreenApiSettings {
    pub instance_id: String,
    pub token: String,
    pub base_url: String,
    /// Chat do grupo (`...@g.us`) que recebe escalações e resumos
    pub group_chat_id: Option<String>,
}

impl Default for GreenApiSettings {
    fn default() -> Self {
        Self {
            instance_id: String::new(),
            token: String::new(),
            base_url: "https://api.green-api.com".to_string(),
            group_chat_id: None,
        }
    }
}

impl GreenApiSettings {
    pub fn is_configured(&self) -> bool {
        !self.instance_id.trim().is_empty() && !self.token.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GoogleDocsSettings {
    pub export_base_url: String,
    pub timeout_secs: u64,
}

impl Default for GoogleDocsSettings {
    fn default() -> Self {
        Self {
            export_base_url: "https://docs.google.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    /// Vem de OPENAI_API_KEY
    pub api_key: Option<String>,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u16,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1200,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerSettings {
    /// Arquivo JSON com o estado dos lembretes
    pub state_file: String,
    /// Lembretes sem resposta antes de escalar para o grupo
    pub escalation_threshold: u32,
    /// Máximo de mensagens por card/responsável
    pub max_messages: u32,
    /// Janela (horas) em que um comentário do responsável conta como atualização
    pub update_window_hours: i64,
    pub active_list_keywords: Vec<String>,
    pub excluded_list_keywords: Vec<String>,
    pub admin_names: Vec<String>,
    pub comment_fetch_concurrency: usize,
    pub auto_scan_enabled: bool,
    /// Hora local do scan diário
    pub scan_hour: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            state_file: "data/reminder_state.json".to_string(),
            escalation_threshold: 3,
            max_messages: 4,
            update_window_hours: 24,
            active_list_keywords: vec![
                "doing".to_string(),
                "in progress".to_string(),
                "in-progress".to_string(),
            ],
            excluded_list_keywords: vec![
                "done".to_string(),
                "completed".to_string(),
                "archive".to_string(),
                "archived".to_string(),
            ],
            admin_names: vec!["Criselle".to_string(), "Admin".to_string()],
            comment_fetch_concurrency: 5,
            auto_scan_enabled: false,
            scan_hour: 9,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MeetingSettings {
    /// Quem conduz a revisão do board na reunião
    pub facilitator_names: Vec<String>,
    /// Cards que recebem comentário por reunião
    pub max_comments: usize,
    pub post_comments: bool,
    pub send_group_summary: bool,
    pub group_summary_notes_chars: usize,
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            facilitator_names: vec!["James Taylor".to_string()],
            max_comments: 5,
            post_comments: true,
            send_group_summary: true,
            group_summary_notes_chars: 250,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TeamSettings {
    pub members_file: String,
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            members_file: "config/team.yaml".to_string(),
        }
    }
}

/// Variáveis de ambiente que sobrescrevem chaves da configuração
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("TRELLO_API_KEY", "trello.api_key"),
    ("TRELLO_TOKEN", "trello.token"),
    ("TRELLO_BOARD_ID", "trello.board_id"),
    ("TRELLO_BOARD_NAME", "trello.board_name"),
    ("GREEN_API_INSTANCE", "green_api.instance_id"),
    ("GREEN_API_TOKEN", "green_api.token"),
    ("WHATSAPP_GROUP_CHAT_ID", "green_api.group_chat_id"),
    ("ADMIN_API_KEY", "server.admin_api_key"),
    ("OPENAI_API_KEY", "ai.api_key"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    builder = builder.set_override(*key, value)?;
                }
            }
        }

        // No Cloud Run / Heroku a porta vem de PORT
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<i64>().ok()) {
            builder = builder.set_override("server.port", port)?;
        }

        builder = builder.add_source(Environment::with_prefix("MEETING_TRELLO").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn is_production() -> bool {
        std::env::var("RUST_ENV").map(|v| v == "production").unwrap_or(false)
    }

    pub fn ai_api_key(&self) -> Option<&str> {
        self.ai
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn group_chat_id(&self) -> Option<&str> {
        self.green_api
            .group_chat_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.trello.board_name, "eeinteractive");
        assert_eq!(settings.tracker.escalation_threshold, 3);
        assert_eq!(settings.tracker.max_messages, 4);
        assert_eq!(settings.tracker.update_window_hours, 24);
        assert_eq!(settings.tracker.comment_fetch_concurrency, 5);
        assert_eq!(settings.tracker.scan_hour, 9);
        assert_eq!(settings.meeting.max_comments, 5);
        assert_eq!(settings.meeting.group_summary_notes_chars, 250);
        assert!(!settings.trello.is_configured());
        assert!(!settings.green_api.is_configured());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "[tracker]\nescalation_threshold = 5\n[green_api]\ngroup_chat_id = \"  \"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.tracker.escalation_threshold, 5);
        assert_eq!(settings.tracker.max_messages, 4);
        assert_eq!(settings.server.port, 8080);
        assert!(settings.group_chat_id().is_none());
        assert!(settings.ai_api_key().is_none());
    }
}
