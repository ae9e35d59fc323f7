//! Feedback individual de participação enviado por WhatsApp

use crate::config::{TeamDirectory, TeamMember};
use crate::models::{
    EngagementLevel, FeedbackDelivery, FeedbackFailure, FeedbackReport, ParticipantFeedback,
};
use crate::utils::logging::{log_whatsapp_error, log_whatsapp_sent};
use crate::utils::string_utils::truncate_with_suffix;
use greenapi::GreenApiClient;

const MAX_STRENGTHS: usize = 3;
const MAX_IMPROVEMENTS: usize = 3;
const PREVIEW_CHARS: usize = 100;

pub fn feedback_message(feedback: &ParticipantFeedback) -> String {
    let level = feedback.engagement_level;
    let emoji = match level {
        EngagementLevel::High => "🔥",
        EngagementLevel::Medium => "⚡",
        EngagementLevel::Low => "🌱",
    };

    let mut lines = vec![
        format!("🎯 Meeting Performance Feedback for {}", feedback.speaker),
        String::new(),
        format!("{} Engagement Level: {}", emoji, level.label()),
        String::new(),
    ];

    if !feedback.strengths.is_empty() {
        lines.push("✅ Your Strengths:".to_string());
        lines.extend(
            feedback
                .strengths
                .iter()
                .take(MAX_STRENGTHS)
                .map(|s| format!("  • {}", s)),
        );
        lines.push(String::new());
    }

    if !feedback.improvements.is_empty() {
        lines.push("📈 Growth Opportunities:".to_string());
        lines.extend(
            feedback
                .improvements
                .iter()
                .take(MAX_IMPROVEMENTS)
                .map(|s| format!("  • {}", s)),
        );
        lines.push(String::new());
    }

    lines.push(
        match level {
            EngagementLevel::High => "🌟 Excellent participation! Keep up the great work.",
            EngagementLevel::Medium => "👍 Good participation! Try the tips above to shine even more.",
            EngagementLevel::Low => {
                "🚀 Every voice matters! These tips will help you contribute more confidently."
            }
        }
        .to_string(),
    );
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push("*AI-generated feedback from meeting analysis*".to_string());

    lines.join("\n")
}

/// Membro do roster para o nome do falante (exato, depois aproximado)
fn roster_member<'a>(team: &'a TeamDirectory, speaker: &str) -> Option<&'a TeamMember> {
    team.get(speaker).or_else(|| team.resolve_full_name(speaker))
}

/// Envia o feedback de cada participante; quem não tem WhatsApp vira falha
pub async fn send_participant_feedback(
    whatsapp: &GreenApiClient,
    team: &TeamDirectory,
    feedback: &[ParticipantFeedback],
) -> FeedbackReport {
    let mut report = FeedbackReport::default();

    for item in feedback {
        let Some(number) = roster_member(team, &item.speaker).and_then(TeamMember::whatsapp) else {
            report.failed.push(FeedbackFailure {
                participant: item.speaker.clone(),
                error: "WhatsApp number not found".to_string(),
            });
            continue;
        };

        let message = feedback_message(item);
        match whatsapp.send_with_retry(number, &message).await {
            Ok(_) => {
                log_whatsapp_sent(number, "participant feedback", 0);
                report.sent.push(FeedbackDelivery {
                    participant: item.speaker.clone(),
                    chat_id: number.to_string(),
                    preview: truncate_with_suffix(&message, PREVIEW_CHARS, "..."),
                });
            }
            Err(e) => {
                log_whatsapp_error(number, &e.to_string());
                report.failed.push(FeedbackFailure {
                    participant: item.speaker.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report.messages_sent = report.sent.len();
    report.messages_failed = report.failed.len();
    tracing::info!(
        "💬 Feedback de participação: {} enviados, {} falhas",
        report.messages_sent,
        report.messages_failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn feedback(speaker: &str, level: EngagementLevel) -> ParticipantFeedback {
        ParticipantFeedback {
            speaker: speaker.into(),
            engagement_level: level,
            engagement_score: 50,
            strengths: vec![
                "Active participation in discussions".into(),
                "Good questioning and curiosity".into(),
                "Contributing to decision-making".into(),
                "Providing detailed explanations".into(),
            ],
            improvements: vec!["Allow others more speaking time".into()],
        }
    }

    fn team() -> TeamDirectory {
        TeamDirectory::new(
            vec![
                TeamMember::new("Levy", Some("237600000002".into())),
                TeamMember::new("Wendy", None),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_feedback_message_format() {
        let text = feedback_message(&feedback("Levy Nkeng", EngagementLevel::High));

        assert!(text.starts_with("🎯 Meeting Performance Feedback for Levy Nkeng\n\n🔥 Engagement Level: High"));
        assert!(text.contains("✅ Your Strengths:\n  • Active participation in discussions"));
        assert!(!text.contains("Providing detailed explanations"));
        assert!(text.contains("📈 Growth Opportunities:\n  • Allow others more speaking time"));
        assert!(text.contains("🌟 Excellent participation!"));
        assert!(text.ends_with("*AI-generated feedback from meeting analysis*"));
    }

    #[test]
    fn test_low_engagement_without_sections() {
        let mut item = feedback("Xu", EngagementLevel::Low);
        item.strengths.clear();
        item.improvements.clear();
        let text = feedback_message(&item);

        assert!(text.contains("🌱 Engagement Level: Low"));
        assert!(!text.contains("Your Strengths"));
        assert!(!text.contains("Growth Opportunities"));
        assert!(text.contains("🚀 Every voice matters!"));
    }

    #[tokio::test]
    async fn test_send_resolves_roster_and_collects_failures() {
        let server = MockServer::start_async().await;
        let send = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/waInstance1101/sendMessage/tok")
                    .json_body_partial(r#"{"chatId": "237600000002@c.us"}"#);
                then.status(200).json_body(json!({"idMessage": "BAE5"}));
            })
            .await;

        let client = GreenApiClient::new("1101", "tok").unwrap().with_base_url(server.base_url());
        let items = vec![
            feedback("Levy Nkeng", EngagementLevel::Medium),
            feedback("Wendy", EngagementLevel::High),
            feedback("Xu", EngagementLevel::Low),
        ];

        let report = send_participant_feedback(&client, &team(), &items).await;

        send.assert_hits_async(1).await;
        assert_eq!(report.messages_sent, 1);
        assert_eq!(report.sent[0].participant, "Levy Nkeng");
        assert_eq!(report.sent[0].chat_id, "237600000002");
        assert!(report.sent[0].preview.ends_with("..."));

        assert_eq!(report.messages_failed, 2);
        assert!(report
            .failed
            .iter()
            .all(|f| f.error == "WhatsApp number not found"));
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/waInstance1101/sendMessage/tok");
                then.status(400).json_body(json!({"message": "bad chat"}));
            })
            .await;

        let client = GreenApiClient::new("1101", "tok").unwrap().with_base_url(server.base_url());
        let report =
            send_participant_feedback(&client, &team(), &[feedback("Levy", EngagementLevel::High)]).await;

        assert_eq!(report.messages_sent, 0);
        assert_eq!(report.messages_failed, 1);
        assert_eq!(report.failed[0].participant, "Levy");
        assert_ne!(report.failed[0].error, "WhatsApp number not found");
    }
}
