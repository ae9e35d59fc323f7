//! Estado persistente dos lembretes por card/responsável
//!
//! Tudo vive em um arquivo JSON (`tracker.state_file`). Cada alteração reescreve
//! o arquivo inteiro via arquivo temporário + rename, com o lock de escrita
//! segurado durante a gravação.

use crate::config::settings::TrackerSettings;
use crate::models::{
    AssigneeStats, DailyStats, MessageKind, MessageLogEntry, MessagePermission, ReminderRecord,
    ReminderStatus, SendDecision,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Mensagens seguidas sem resposta que bloqueiam novos envios
const MAX_UNANSWERED: usize = 3;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Failed to access tracker state: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tracker state: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

/// Intervalo (horas) até o próximo lembrete depois de `n` lembretes já enviados
pub fn escalation_schedule(n: u32) -> i64 {
    match n {
        0 => 24,
        1 => 12,
        2 => 6,
        3 => 4,
        _ => 24,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrackerState {
    #[serde(default)]
    records: HashMap<String, ReminderRecord>,
    #[serde(default)]
    messages: Vec<MessageLogEntry>,
}

#[derive(Clone)]
pub struct ReminderTracker {
    /// `None` = somente memória
    path: Option<PathBuf>,
    state: Arc<RwLock<TrackerState>>,
    escalation_threshold: u32,
    max_messages: u32,
    update_window_hours: i64,
}

impl ReminderTracker {
    /// Abre (ou cria) o estado no arquivo configurado
    pub async fn open(settings: &TrackerSettings) -> TrackerResult<Self> {
        let path = PathBuf::from(&settings.state_file);
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => TrackerState::default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TrackerState::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "📒 Estado de lembretes carregado de {} ({} registros, {} mensagens)",
            path.display(),
            state.records.len(),
            state.messages.len()
        );

        Ok(Self::with_state(Some(path), state, settings))
    }

    pub fn in_memory(settings: &TrackerSettings) -> Self {
        Self::with_state(None, TrackerState::default(), settings)
    }

    fn with_state(path: Option<PathBuf>, state: TrackerState, settings: &TrackerSettings) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
            escalation_threshold: settings.escalation_threshold,
            max_messages: settings.max_messages,
            update_window_hours: settings.update_window_hours,
        }
    }

    pub fn escalation_threshold(&self) -> u32 {
        self.escalation_threshold
    }

    async fn persist(&self, state: &TrackerState) -> TrackerResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Registro atual ou um registro `new` (não persistido)
    pub async fn get_status(&self, card_id: &str, user: &str) -> ReminderRecord {
        let state = self.state.read().await;
        state
            .records
            .get(&ReminderRecord::key(card_id, user))
            .cloned()
            .unwrap_or_else(|| ReminderRecord::new(card_id, user))
    }

    /// Conta mais um lembrete enviado
    pub async fn increment(
        &self,
        card_id: &str,
        user: &str,
        card_name: Option<&str>,
        whatsapp: Option<&str>,
    ) -> TrackerResult<ReminderRecord> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let record = state
            .records
            .entry(ReminderRecord::key(card_id, user))
            .or_insert_with(|| ReminderRecord::new(card_id, user));

        if let Some(name) = card_name {
            record.card_name = name.to_string();
        }
        if let Some(whatsapp) = whatsapp {
            record.whatsapp = Some(whatsapp.to_string());
        }

        record.reminder_count += 1;
        record.first_reminder_date.get_or_insert(now);
        record.last_reminder_date = Some(now);
        record.status = ReminderStatus::Active;
        if record.reminder_count >= self.escalation_threshold {
            record.status = ReminderStatus::Escalated;
            record.escalated = true;
        }
        record.next_message_due =
            Some(now + Duration::hours(escalation_schedule(record.reminder_count - 1)));

        let updated = record.clone();
        self.persist(&state).await?;

        tracing::debug!(
            "🔔 Lembrete #{} para {} no card {}",
            updated.reminder_count,
            user,
            card_id
        );
        Ok(updated)
    }

    /// Cards resolvidos continuam resolvidos
    fn reset_record(record: &mut ReminderRecord, now: DateTime<Utc>) {
        record.reminder_count = 0;
        record.escalated = false;
        if record.status != ReminderStatus::Resolved {
            record.status = ReminderStatus::Active;
        }
        record.last_comment_date = Some(now);
        record.next_message_due = None;
    }

    /// O responsável comentou: zera a contagem. `None` se o par não existe.
    pub async fn reset(&self, card_id: &str, user: &str) -> TrackerResult<Option<ReminderRecord>> {
        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(&ReminderRecord::key(card_id, user)) else {
            return Ok(None);
        };

        Self::reset_record(record, Utc::now());
        let updated = record.clone();
        self.persist(&state).await?;
        Ok(Some(updated))
    }

    /// Zera a contagem se o comentário for posterior ao último lembrete
    pub async fn note_assignee_comment(
        &self,
        card_id: &str,
        user: &str,
        comment_date: DateTime<Utc>,
    ) -> TrackerResult<bool> {
        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(&ReminderRecord::key(card_id, user)) else {
            return Ok(false);
        };

        let responded = record
            .last_reminder_date
            .is_some_and(|last| comment_date > last);
        if !responded || record.reminder_count == 0 {
            return Ok(false);
        }

        Self::reset_record(record, comment_date);
        self.persist(&state).await?;
        tracing::info!("✅ {} respondeu no card {}, contagem zerada", user, card_id);
        Ok(true)
    }

    pub async fn resolve(&self, card_id: &str, user: &str) -> TrackerResult<ReminderRecord> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .entry(ReminderRecord::key(card_id, user))
            .or_insert_with(|| ReminderRecord::new(card_id, user));

        record.status = ReminderStatus::Resolved;
        record.resolved_date = Some(Utc::now());
        record.next_message_due = None;

        let updated = record.clone();
        self.persist(&state).await?;
        Ok(updated)
    }

    /// Todos os registros, do mais lembrado para o menos
    pub async fn records(&self) -> Vec<ReminderRecord> {
        let state = self.state.read().await;
        let mut records: Vec<ReminderRecord> = state.records.values().cloned().collect();
        records.sort_by(|a, b| {
            b.reminder_count
                .cmp(&a.reminder_count)
                .then_with(|| a.card_id.cmp(&b.card_id))
        });
        records
    }

    pub async fn escalated_records(&self) -> Vec<ReminderRecord> {
        self.records()
            .await
            .into_iter()
            .filter(|r| r.escalated && r.status != ReminderStatus::Resolved)
            .collect()
    }

    /// Remove todos os registros de um card. Retorna quantos foram removidos.
    pub async fn remove_card(&self, card_id: &str) -> TrackerResult<usize> {
        let mut state = self.state.write().await;
        let before = state.records.len();
        state.records.retain(|_, r| r.card_id != card_id);
        let removed = before - state.records.len();
        if removed > 0 {
            self.persist(&state).await?;
        }
        Ok(removed)
    }

    /// Decide se um lembrete deve sair agora
    pub async fn decide_send(
        &self,
        card_id: &str,
        user: &str,
        last_assignee_comment: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> TrackerResult<SendDecision> {
        let existing = {
            let state = self.state.read().await;
            state.records.get(&ReminderRecord::key(card_id, user)).cloned()
        };

        let Some(record) = existing else {
            let recent = last_assignee_comment
                .is_some_and(|c| now - c < Duration::hours(self.update_window_hours));
            if recent {
                return Ok(SendDecision::skip("updated recently"));
            }
            return Ok(SendDecision::Send {
                escalation_level: 1,
                next_followup_hours: escalation_schedule(0),
            });
        };

        if record.status == ReminderStatus::Resolved {
            return Ok(SendDecision::skip("card resolved"));
        }

        if let (Some(comment), Some(last_reminder)) = (last_assignee_comment, record.last_reminder_date) {
            if comment > last_reminder {
                self.note_assignee_comment(card_id, user, comment).await?;
                return Ok(SendDecision::skip("assignee responded"));
            }
        }

        if let Some(due) = record.next_message_due.filter(|due| *due > now) {
            let minutes = (due - now).num_minutes();
            let hours = (minutes + 59) / 60;
            return Ok(SendDecision::skip(format!("next reminder due in {}h", hours)));
        }

        if record.reminder_count >= self.max_messages {
            return Ok(SendDecision::skip(format!(
                "max messages reached ({})",
                self.max_messages
            )));
        }

        Ok(SendDecision::Send {
            escalation_level: record.reminder_count + 1,
            next_followup_hours: escalation_schedule(record.reminder_count),
        })
    }

    pub async fn log_message(
        &self,
        card_id: &str,
        user: &str,
        content: &str,
        escalation_level: u32,
        kind: MessageKind,
    ) -> TrackerResult<MessageLogEntry> {
        let entry = MessageLogEntry {
            id: Uuid::new_v4(),
            card_id: card_id.to_string(),
            user: user.to_string(),
            content: content.to_string(),
            escalation_level,
            kind,
            sent_at: Utc::now(),
            response_received: false,
            response_at: None,
        };

        let mut state = self.state.write().await;
        state.messages.push(entry.clone());
        self.persist(&state).await?;
        Ok(entry)
    }

    /// Marca as mensagens em aberto como respondidas e zera o registro
    pub async fn mark_response_received(&self, card_id: &str, user: &str) -> TrackerResult<usize> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut marked = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.card_id == card_id && m.user == user && !m.response_received)
        {
            message.response_received = true;
            message.response_at = Some(now);
            marked += 1;
        }

        if let Some(record) = state.records.get_mut(&ReminderRecord::key(card_id, user)) {
            Self::reset_record(record, now);
        }

        self.persist(&state).await?;
        Ok(marked)
    }

    /// Cooldown desde a última mensagem e limite de mensagens sem resposta
    pub async fn can_send_message(
        &self,
        card_id: &str,
        user: &str,
        cooldown_hours: i64,
        now: DateTime<Utc>,
    ) -> MessagePermission {
        let state = self.state.read().await;
        let mut messages: Vec<&MessageLogEntry> = state
            .messages
            .iter()
            .filter(|m| m.card_id == card_id && m.user == user)
            .collect();
        messages.sort_by_key(|m| m.sent_at);

        let last_message = messages.last().map(|m| m.sent_at);
        let unanswered = messages
            .iter()
            .rev()
            .take_while(|m| !m.response_received)
            .count();

        let (allowed, reason) = match last_message {
            Some(last) if now - last < Duration::hours(cooldown_hours) => (
                false,
                format!("cooldown: last message {}h ago", (now - last).num_hours()),
            ),
            _ if unanswered >= MAX_UNANSWERED => (
                false,
                format!("{} consecutive messages without response", unanswered),
            ),
            _ => (true, "ok".to_string()),
        };

        MessagePermission {
            allowed,
            reason,
            messages_sent: messages.len(),
            unanswered,
            last_message,
        }
    }

    pub async fn daily_stats(&self, date: NaiveDate) -> DailyStats {
        let state = self.state.read().await;
        let messages: Vec<&MessageLogEntry> = state
            .messages
            .iter()
            .filter(|m| m.sent_at.date_naive() == date)
            .collect();

        let sent = messages.len();
        let responses = messages.iter().filter(|m| m.response_received).count();
        let cards: HashSet<&str> = messages.iter().map(|m| m.card_id.as_str()).collect();
        let assignees: HashSet<&str> = messages.iter().map(|m| m.user.as_str()).collect();

        DailyStats {
            date: date.format("%Y-%m-%d").to_string(),
            messages_sent: sent,
            responses_received: responses,
            unique_cards: cards.len(),
            unique_assignees: assignees.len(),
            response_rate: response_rate(responses, sent),
        }
    }

    pub async fn assignee_stats(&self, name: &str) -> AssigneeStats {
        let state = self.state.read().await;
        let messages: Vec<&MessageLogEntry> = state
            .messages
            .iter()
            .filter(|m| m.user.eq_ignore_ascii_case(name))
            .collect();

        let total = messages.len();
        let responses = messages.iter().filter(|m| m.response_received).count();

        AssigneeStats {
            assignee: name.to_string(),
            total_messages: total,
            responses,
            response_rate: response_rate(responses, total),
            last_message: messages.iter().map(|m| m.sent_at).max(),
        }
    }
}

fn response_rate(responses: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (responses as f64 / total as f64 * 1000.0).round() / 10.0
}
