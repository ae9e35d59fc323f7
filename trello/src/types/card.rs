//! Cards do Trello

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card de um board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,

    /// Descrição (markdown) do card
    #[serde(default)]
    pub desc: String,

    #[serde(default)]
    pub id_list: String,

    /// IDs dos membros atribuídos ao card
    #[serde(default)]
    pub id_members: Vec<String>,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub closed: bool,

    #[serde(default)]
    pub date_last_activity: Option<DateTime<Utc>>,
}

impl Card {
    /// Cria um card mínimo (usado em testes e matching offline)
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            desc: String::new(),
            id_list: String::new(),
            id_members: Vec::new(),
            url: String::new(),
            closed: false,
            date_last_activity: None,
        }
    }

    /// Cards de instrução do board ("READ - RULES WHEN ADDING TASK - DO NOT DELETE")
    /// nunca participam de matching nem de cobranças
    pub fn is_meta_card(&self) -> bool {
        let upper = self.name.to_uppercase();
        upper.starts_with("READ")
            || upper.contains("DO NOT DELETE")
            || upper.contains("RULES")
            || upper.contains("INSTRUCTIONS")
            || upper.contains("TEMPLATE")
    }

    /// Descrição truncada em `max_chars` caracteres
    pub fn short_description(&self, max_chars: usize) -> String {
        self.desc.chars().take(max_chars).collect()
    }

    /// Horas desde a última atividade no card (999.0 quando desconhecido)
    pub fn hours_since_activity(&self, now: DateTime<Utc>) -> f64 {
        match self.date_last_activity {
            Some(date) => (now - date).num_seconds() as f64 / 3600.0,
            None => 999.0,
        }
    }
}
