use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    New,
    Active,
    Escalated,
    Resolved,
}

/// Estado de lembretes de um par card/responsável
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub card_id: String,
    pub card_name: String,
    pub assigned_user: String,
    pub whatsapp: Option<String>,
    pub reminder_count: u32,
    pub first_reminder_date: Option<DateTime<Utc>>,
    pub last_reminder_date: Option<DateTime<Utc>>,
    pub status: ReminderStatus,
    pub escalated: bool,
    pub last_comment_date: Option<DateTime<Utc>>,
    pub resolved_date: Option<DateTime<Utc>>,
    pub next_message_due: Option<DateTime<Utc>>,
}

impl ReminderRecord {
    pub fn new(card_id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            card_name: String::new(),
            assigned_user: user.into(),
            whatsapp: None,
            reminder_count: 0,
            first_reminder_date: None,
            last_reminder_date: None,
            status: ReminderStatus::New,
            escalated: false,
            last_comment_date: None,
            resolved_date: None,
            next_message_due: None,
        }
    }

    /// Chave de armazenamento `"{card_id}_{user}"`
    pub fn key(card_id: &str, user: &str) -> String {
        format!("{}_{}", card_id, user)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    IndividualReminder,
    GroupEscalation,
    MeetingSummary,
    ManualUpdate,
}

/// Mensagem enviada, guardada para estatísticas e cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: Uuid,
    pub card_id: String,
    pub user: String,
    pub content: String,
    pub escalation_level: u32,
    pub kind: MessageKind,
    pub sent_at: DateTime<Utc>,
    pub response_received: bool,
    pub response_at: Option<DateTime<Utc>>,
}

/// Decisão de enviar (ou não) um lembrete agora
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SendDecision {
    Send {
        escalation_level: u32,
        next_followup_hours: i64,
    },
    Skip {
        reason: String,
    },
}

impl SendDecision {
    pub fn should_send(&self) -> bool {
        matches!(self, SendDecision::Send { .. })
    }

    pub(crate) fn skip(reason: impl Into<String>) -> Self {
        SendDecision::Skip {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub messages_sent: usize,
    pub responses_received: usize,
    pub unique_cards: usize,
    pub unique_assignees: usize,
    /// Percentual (0 a 100)
    pub response_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssigneeStats {
    pub assignee: String,
    pub total_messages: usize,
    pub responses: usize,
    pub response_rate: f64,
    pub last_message: Option<DateTime<Utc>>,
}

/// Resultado de `can_send_message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePermission {
    pub allowed: bool,
    pub reason: String,
    pub messages_sent: usize,
    pub unanswered: usize,
    pub last_message: Option<DateTime<Utc>>,
}
