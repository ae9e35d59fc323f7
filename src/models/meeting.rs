use super::{Assignment, CardMatch};
use ia_service::MeetingSummary;
use serde::{Deserialize, Serialize};

/// Transcrições menores que isso na aba "Transcript" são ignoradas
pub const MIN_TRANSCRIPT_TAB_CHARS: usize = 500;

/// Conteúdo de um Google Doc separado por seção
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocContent {
    pub raw_text: String,
    pub notes: String,
    pub transcript: String,
    pub trello_board_review: String,
    pub meeting_summary: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    pub objectives: Vec<String>,
}

impl DocContent {
    /// Documento sem seções (texto colado diretamente)
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            raw_text: text.into(),
            ..Default::default()
        }
    }

    /// A aba de transcrição quando tem conteúdo suficiente, senão o texto inteiro
    pub fn best_transcript(&self) -> &str {
        if self.transcript.trim().chars().count() > MIN_TRANSCRIPT_TAB_CHARS {
            &self.transcript
        } else {
            &self.raw_text
        }
    }

    pub fn has_board_review(&self) -> bool {
        !self.trello_board_review.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub assignee: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerMetrics {
    pub speaker: String,
    pub word_count: usize,
    pub message_count: usize,
    pub avg_message_length: f64,
    pub questions: usize,
    pub decisions: usize,
    pub participation_pct: f64,
    /// 0 a 100
    pub engagement_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 70 => EngagementLevel::High,
            s if s >= 40 => EngagementLevel::Medium,
            _ => EngagementLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EngagementLevel::High => "High",
            EngagementLevel::Medium => "Medium",
            EngagementLevel::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantFeedback {
    pub speaker: String,
    pub engagement_level: EngagementLevel,
    pub engagement_score: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Resultado da análise de uma transcrição (sem IA)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingAnalysis {
    pub participants: Vec<String>,
    pub key_discussions: Vec<String>,
    pub decisions: Vec<String>,
    pub action_lines: Vec<String>,
    pub objectives: Vec<String>,
    pub key_points: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub duration: String,
    pub word_count: usize,
    pub speaker_metrics: Vec<SpeakerMetrics>,
    pub feedback: Vec<ParticipantFeedback>,
}

/// Trecho da reunião dedicado a um card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDiscussion {
    pub card_id: String,
    pub card_name: String,
    pub speakers: Vec<String>,
    pub lines: Vec<String>,
    pub confidence: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscussionSummary {
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessTranscriptRequest {
    #[serde(default, alias = "google_docs_url")]
    pub url: Option<String>,
    #[serde(default, alias = "text")]
    pub direct_text: Option<String>,
    #[serde(default)]
    pub post_comments: Option<bool>,
    #[serde(default)]
    pub send_summary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentError {
    pub card_id: String,
    pub card_name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAssignment {
    pub card_id: String,
    pub card_name: String,
    pub assignee: Option<Assignment>,
    pub candidates: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTranscriptResponse {
    pub success: bool,
    pub message: String,
    /// "google_docs" ou "direct_text"
    pub source_type: String,
    pub source_url: Option<String>,
    pub word_count: usize,
    pub analysis: MeetingAnalysis,
    pub summary: Option<MeetingSummary>,
    pub summary_error: Option<String>,
    pub matched_cards: Vec<CardMatch>,
    pub cards_found: usize,
    pub comments_posted: usize,
    pub comment_errors: Vec<CommentError>,
    pub card_assignments: Vec<CardAssignment>,
    pub group_summary: String,
    pub summary_sent: bool,
    pub processing_ms: u64,
}

/// Feedback entregue a um participante
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDelivery {
    pub participant: String,
    pub chat_id: String,
    /// Início da mensagem enviada
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackFailure {
    pub participant: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub messages_sent: usize,
    pub messages_failed: usize,
    pub sent: Vec<FeedbackDelivery>,
    pub failed: Vec<FeedbackFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_transcript_prefers_long_tab() {
        let mut doc = DocContent::from_text("raw text");
        assert_eq!(doc.best_transcript(), "raw text");

        doc.transcript = "short".to_string();
        assert_eq!(doc.best_transcript(), "raw text");

        doc.transcript = "x".repeat(501);
        assert_eq!(doc.best_transcript().len(), 501);
    }

    #[test]
    fn test_engagement_level() {
        assert_eq!(EngagementLevel::from_score(70), EngagementLevel::High);
        assert_eq!(EngagementLevel::from_score(40), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_score(39), EngagementLevel::Low);
    }

    #[test]
    fn test_request_aliases() {
        let req: ProcessTranscriptRequest =
            serde_json::from_str(r#"{"google_docs_url": "https://docs.google.com/document/d/abc/edit"}"#)
                .unwrap();
        assert!(req.url.is_some());
        assert!(req.direct_text.is_none());
    }
}
