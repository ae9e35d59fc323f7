use serde::{Deserialize, Serialize};

/// Estratégia que produziu um match de card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Item da seção "Trello Board Review" das notas
    NotesToTrello,
    /// Pontuação por conteúdo (nome, palavras, grupos de palavras-chave)
    Content,
    /// Matching por IA
    Ai,
    KeywordFallback,
    /// Composite: nome inteiro presente ou score >= 0.9
    Exact,
    Fuzzy,
    Partial,
}

/// Card do Trello identificado na reunião
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardMatch {
    pub card_id: String,
    pub card_name: String,
    pub card_url: String,
    /// 0 a 100
    pub confidence: f64,
    pub match_type: MatchType,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_reference: Option<String>,
}

/// Origem de um candidato a responsável
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Checklist,
    LastCommenter,
    Transcript,
    CommentPattern,
    CardMember,
    Description,
    DefaultRule,
    Fallback,
}

/// Candidato a responsável por um card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub whatsapp: Option<String>,
    pub source: AssignmentSource,
    /// 0 a 100
    pub confidence: u8,
    pub method: String,
}

impl Assignment {
    /// Peso usado na escolha do responsável (checklist sempre vence)
    pub fn rank(&self) -> u8 {
        match self.source {
            AssignmentSource::Checklist => 100,
            _ => self.confidence,
        }
    }
}
