//! Envio dos lembretes individuais e da escalação para o grupo

use crate::models::{
    CardUpdateStatus, DispatchReport, MessageKind, OutgoingMessage, ReminderPreview, ReminderStatus,
    SendDecision, SkippedCard,
};
use crate::services::reminder_tracker::ReminderTracker;
use crate::utils::logging::{log_escalation_sent, log_reminder_incremented, log_whatsapp_error, log_whatsapp_sent};
use crate::utils::{AppError, AppResult};
use chrono::{DateTime, Utc};
use greenapi::GreenApiClient;
use std::collections::BTreeMap;

const SIGNATURE: &str = "*JGV EEsystems AI Team Tracker*";

/// Card incluído numa mensagem, com a contagem de lembretes antes do envio
#[derive(Debug, Clone)]
struct PlannedCard {
    status: CardUpdateStatus,
    reminder_count: u32,
    escalation_level: u32,
}

#[derive(Debug, Default)]
struct DispatchPlan {
    /// (usuário, chat, cards)
    individual: Vec<(String, String, Vec<PlannedCard>)>,
    /// (usuário, cards)
    escalated: Vec<(String, Vec<PlannedCard>)>,
    skipped: Vec<SkippedCard>,
}

fn urgency_icon(hours: f64) -> &'static str {
    if hours > 72.0 {
        "🔴"
    } else if hours > 48.0 {
        "🟡"
    } else {
        "🟢"
    }
}

fn days(hours: f64) -> i64 {
    (hours / 24.0).floor() as i64
}

/// Lembrete individual cobrindo todos os cards do usuário
fn individual_message(user: &str, cards: &[PlannedCard]) -> String {
    let mut message = format!(
        "🤖 AUTOMATED REMINDER: Hey {}, these cards need updates (over 24 hours). \
Please comment with your progress or these will escalate to the main group after 3 reminders.\n\n\
📋 Cards requiring updates ({}):\n\n",
        user,
        cards.len()
    );

    for (i, card) in cards.iter().enumerate() {
        let hours = card.status.hours_since_assigned_update;
        let reminder = if card.reminder_count > 0 {
            format!(" (Reminder #{})", card.reminder_count + 1)
        } else {
            String::new()
        };
        message.push_str(&format!(
            "{} {}. *{}*{}\n   ⏰ {} days without update\n   🔗 {}\n\n",
            urgency_icon(hours),
            i + 1,
            card.status.card_name,
            reminder,
            days(hours),
            card.status.card_url
        ));
    }

    message.push_str("Please update these cards with your current progress. Thanks! 🚀\n\n");
    message.push_str(SIGNATURE);
    message
}

/// Escalação para o grupo, agrupada por usuário
fn escalation_message(escalated: &[(String, Vec<PlannedCard>)]) -> String {
    let mut message = String::from(
        "🚨 AUTOMATED ESCALATION: Cards Requiring Immediate Attention 🚨\n\n\
The following team members have not responded to 3+ reminders about their assigned cards:\n",
    );

    for (user, cards) in escalated {
        message.push_str(&format!("\n👤 *{}* ({} cards):\n", user, cards.len()));
        for card in cards {
            message.push_str(&format!(
                "   🔴 {} ({} days, {} reminders)\n       🔗 {}\n",
                card.status.card_name,
                days(card.status.hours_since_assigned_update),
                card.reminder_count,
                card.status.card_url
            ));
        }
    }

    message.push_str(
        "\n⚠️ Please follow up with these team members immediately or reassign these cards.\n\n",
    );
    message.push_str(SIGNATURE);
    message
}

#[derive(Clone)]
pub struct ReminderDispatcher {
    whatsapp: Option<GreenApiClient>,
    tracker: ReminderTracker,
    group_chat_id: Option<String>,
}

impl ReminderDispatcher {
    pub fn new(
        whatsapp: Option<GreenApiClient>,
        tracker: ReminderTracker,
        group_chat_id: Option<String>,
    ) -> Self {
        Self {
            whatsapp,
            tracker,
            group_chat_id,
        }
    }

    async fn plan(&self, cards: &[CardUpdateStatus], now: DateTime<Utc>) -> AppResult<DispatchPlan> {
        let mut plan = DispatchPlan::default();
        let mut by_user: BTreeMap<String, Vec<&CardUpdateStatus>> = BTreeMap::new();

        for card in cards.iter().filter(|c| c.needs_update) {
            if card.whatsapp.as_deref().map_or(true, |w| w.trim().is_empty()) {
                plan.skipped.push(SkippedCard {
                    card_id: card.card_id.clone(),
                    user: card.assigned_user.clone(),
                    reason: "no WhatsApp number".to_string(),
                });
                continue;
            }
            by_user.entry(card.assigned_user.clone()).or_default().push(card);
        }

        for (user, user_cards) in by_user {
            let mut regular = Vec::new();
            let mut escalated = Vec::new();
            let mut chat_id = String::new();

            for card in user_cards {
                let record = self.tracker.get_status(&card.card_id, &user).await;
                if record.status == ReminderStatus::Resolved {
                    plan.skipped.push(SkippedCard {
                        card_id: card.card_id.clone(),
                        user: user.clone(),
                        reason: "card resolved".to_string(),
                    });
                    continue;
                }
                if record.escalated || record.reminder_count >= self.tracker.escalation_threshold() {
                    escalated.push(PlannedCard {
                        status: card.clone(),
                        reminder_count: record.reminder_count,
                        escalation_level: record.reminder_count,
                    });
                    continue;
                }

                match self
                    .tracker
                    .decide_send(&card.card_id, &user, card.last_assignee_comment, now)
                    .await?
                {
                    SendDecision::Send {
                        escalation_level, ..
                    } => {
                        chat_id = card.whatsapp.clone().unwrap_or_default();
                        regular.push(PlannedCard {
                            status: card.clone(),
                            reminder_count: record.reminder_count,
                            escalation_level,
                        });
                    }
                    SendDecision::Skip { reason } => plan.skipped.push(SkippedCard {
                        card_id: card.card_id.clone(),
                        user: user.clone(),
                        reason,
                    }),
                }
            }

            if !regular.is_empty() {
                plan.individual.push((user.clone(), chat_id, regular));
            }
            if !escalated.is_empty() {
                plan.escalated.push((user, escalated));
            }
        }

        Ok(plan)
    }

    fn outgoing(&self, plan: &DispatchPlan) -> (Vec<OutgoingMessage>, Option<OutgoingMessage>) {
        let individual = plan
            .individual
            .iter()
            .map(|(user, chat_id, cards)| OutgoingMessage {
                chat_id: chat_id.clone(),
                recipient: user.clone(),
                card_ids: cards.iter().map(|c| c.status.card_id.clone()).collect(),
                text: individual_message(user, cards),
                escalation: false,
            })
            .collect();

        let escalation = (!plan.escalated.is_empty()).then(|| OutgoingMessage {
            chat_id: self.group_chat_id.clone().unwrap_or_default(),
            recipient: "GROUP ESCALATION".to_string(),
            card_ids: plan
                .escalated
                .iter()
                .flat_map(|(_, cards)| cards.iter().map(|c| c.status.card_id.clone()))
                .collect(),
            text: escalation_message(&plan.escalated),
            escalation: true,
        });

        (individual, escalation)
    }

    /// Monta as mensagens sem enviar
    pub async fn preview(&self, cards: &[CardUpdateStatus]) -> AppResult<ReminderPreview> {
        let plan = self.plan(cards, Utc::now()).await?;
        let (individual, escalation) = self.outgoing(&plan);
        Ok(ReminderPreview {
            individual,
            escalation,
            skipped: plan.skipped,
        })
    }

    /// Envia os lembretes e a escalação; a contagem só sobe após envio bem-sucedido
    pub async fn dispatch(&self, cards: &[CardUpdateStatus]) -> AppResult<DispatchReport> {
        let whatsapp = self
            .whatsapp
            .as_ref()
            .ok_or_else(|| AppError::WhatsApp("WhatsApp (Green API) not configured".to_string()))?;

        let plan = self.plan(cards, Utc::now()).await?;
        let (individual, escalation) = self.outgoing(&plan);
        let mut report = DispatchReport {
            skipped: plan.skipped.clone(),
            ..Default::default()
        };

        for (message, (user, _, planned)) in individual.iter().zip(&plan.individual) {
            if let Err(e) = whatsapp.send_with_retry(&message.chat_id, &message.text).await {
                log_whatsapp_error(&message.chat_id, &e.to_string());
                report.errors.push(format!("Reminder to {} failed: {}", user, e));
                continue;
            }
            log_whatsapp_sent(&message.chat_id, "reminder", planned.len());
            report.reminders_sent += 1;

            for card in planned {
                let status = &card.status;
                let record = self
                    .tracker
                    .increment(
                        &status.card_id,
                        user,
                        Some(&status.card_name),
                        status.whatsapp.as_deref(),
                    )
                    .await?;
                log_reminder_incremented(&status.card_id, user, record.reminder_count, record.escalated);
                self.tracker
                    .log_message(
                        &status.card_id,
                        user,
                        &message.text,
                        card.escalation_level,
                        MessageKind::IndividualReminder,
                    )
                    .await?;
                report.cards_reminded += 1;
            }
        }

        if let Some(message) = escalation {
            let escalated_cards = message.card_ids.len();
            match self.group_chat_id.as_deref().filter(|id| !id.trim().is_empty()) {
                None => report
                    .errors
                    .push("Group chat id not configured, escalation not sent".to_string()),
                Some(group) => match whatsapp.send_with_retry(group, &message.text).await {
                    Ok(_) => {
                        log_escalation_sent(plan.escalated.len(), escalated_cards);
                        for (user, cards) in &plan.escalated {
                            for card in cards {
                                self.tracker
                                    .log_message(
                                        &card.status.card_id,
                                        user,
                                        &message.text,
                                        card.escalation_level,
                                        MessageKind::GroupEscalation,
                                    )
                                    .await?;
                            }
                        }
                        report.escalations_sent = 1;
                        report.escalated_cards = escalated_cards;
                    }
                    Err(e) => {
                        log_whatsapp_error(group, &e.to_string());
                        report.errors.push(format!("Group escalation failed: {}", e));
                    }
                },
            }
        }

        tracing::info!(
            "📨 Lembretes: {} enviados ({} cards), {} escalações, {} ignorados, {} erros",
            report.reminders_sent,
            report.cards_reminded,
            report.escalations_sent,
            report.skipped.len(),
            report.errors.len()
        );
        Ok(report)
    }
}
