use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Normal,
}

impl Priority {
    pub fn from_hours(hours_since_update: f64) -> Self {
        if hours_since_update > 72.0 {
            Priority::High
        } else if hours_since_update > 24.0 {
            Priority::Medium
        } else {
            Priority::Normal
        }
    }
}

/// Situação de um card no scan de atualizações
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardUpdateStatus {
    pub card_id: String,
    pub card_name: String,
    pub card_url: String,
    pub list_name: String,
    pub assigned_user: String,
    pub whatsapp: Option<String>,
    pub assignment_confidence: u8,
    pub assignment_method: String,
    pub hours_since_activity: f64,
    pub hours_since_assigned_update: f64,
    pub last_assignee_comment: Option<DateTime<Utc>>,
    pub needs_update: bool,
    pub priority: Priority,
    #[serde(default)]
    pub reminder_count: u32,
    #[serde(default)]
    pub escalated: bool,
}

impl CardUpdateStatus {
    pub fn days_without_update(&self) -> i64 {
        (self.hours_since_assigned_update / 24.0).floor() as i64
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Varre todas as listas (não só "Doing")
    #[serde(default)]
    pub scan_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub board_name: String,
    pub lists_scanned: Vec<String>,
    pub cards: Vec<CardUpdateStatus>,
    pub cards_needing_updates: usize,
    pub total_cards: usize,
    pub processing_ms: u64,
}

impl ScanReport {
    pub fn needing_updates(&self) -> Vec<CardUpdateStatus> {
        self.cards.iter().filter(|c| c.needs_update).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCard {
    pub card_id: String,
    pub user: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchReport {
    pub reminders_sent: usize,
    pub cards_reminded: usize,
    pub escalations_sent: usize,
    pub escalated_cards: usize,
    pub skipped: Vec<SkippedCard>,
    pub errors: Vec<String>,
}

/// Mensagem montada (enviada ou apenas pré-visualizada)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub recipient: String,
    pub card_ids: Vec<String>,
    pub text: String,
    pub escalation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderPreview {
    pub individual: Vec<OutgoingMessage>,
    pub escalation: Option<OutgoingMessage>,
    pub skipped: Vec<SkippedCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_hours() {
        assert_eq!(Priority::from_hours(999.0), Priority::High);
        assert_eq!(Priority::from_hours(72.0), Priority::Medium);
        assert_eq!(Priority::from_hours(24.5), Priority::Medium);
        assert_eq!(Priority::from_hours(24.0), Priority::Normal);
    }
}
