//! Textos gerados a partir da reunião: comentário de card e resumo do grupo

use crate::models::{Assignment, CardDiscussion};
use crate::services::meeting_parser::summarize_discussion;
use crate::utils::truncate_with_suffix;
use chrono::NaiveDate;
use ia_service::MeetingSummary;
use trello::matching::tokenize;

const MAX_CANDIDATES: usize = 3;
const MAX_DISCUSSION_LINES: usize = 4;
const MAX_DOC_INSIGHTS: usize = 2;
const MIN_NOTES_CHARS: usize = 10;

fn confidence_icon(confidence: u8) -> &'static str {
    if confidence >= 85 {
        "🎯"
    } else if confidence >= 70 {
        "📝"
    } else {
        "💭"
    }
}

/// Comentário postado num card identificado na reunião
#[derive(Debug, Clone)]
pub struct MeetingComment<'a> {
    pub card_name: &'a str,
    pub date: NaiveDate,
    /// Candidatos do melhor para o pior
    pub candidates: &'a [Assignment],
    pub discussion: Option<&'a CardDiscussion>,
    pub doc_key_points: &'a [String],
}

impl<'a> MeetingComment<'a> {
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        parts.push(format!("📅 **Meeting Update - {}**", self.date.format("%B %d, %Y")));
        parts.push(String::new());

        if !self.candidates.is_empty() {
            parts.push("**🎯 Assignment Analysis:**".to_string());
            for candidate in self.candidates.iter().take(MAX_CANDIDATES) {
                parts.push(format!(
                    "{} **{}** - {} ({}% confidence)",
                    confidence_icon(candidate.confidence),
                    candidate.name,
                    candidate.method,
                    candidate.confidence
                ));
            }
            parts.push(String::new());
            parts.push(format!("**📌 Primary Assignee:** {}", self.candidates[0].name));
            parts.push(String::new());
        }

        match self.discussion.filter(|d| !d.lines.is_empty()) {
            Some(discussion) => {
                parts.push("**💬 Card-Specific Discussion:**".to_string());
                if !discussion.speakers.is_empty() {
                    parts.push(format!("*Participants: {}*", discussion.speakers.join(", ")));
                }
                parts.push(String::new());

                let summary = summarize_discussion(&discussion.lines);
                if summary.key_points.is_empty() && summary.action_items.is_empty() {
                    parts.extend(
                        discussion
                            .lines
                            .iter()
                            .take(MAX_DISCUSSION_LINES)
                            .map(|l| format!("> {}", l)),
                    );
                } else {
                    parts.extend(summary.key_points.iter().map(|p| format!("• {}", p)));
                    parts.extend(summary.action_items.iter().map(|a| format!("➡️ {}", a)));
                }
                parts.push(String::new());
            }
            None => {
                parts.push("**💬 Discussion Status:**".to_string());
                parts.push(
                    "> This card was mentioned in the meeting but no specific discussion was captured."
                        .to_string(),
                );
                parts.push("> Please check with the team for any updates or decisions made.".to_string());
                parts.push(String::new());
            }
        }

        let insights = matching_key_points(self.card_name, self.doc_key_points);
        if !insights.is_empty() {
            parts.push("**📄 Additional Notes:**".to_string());
            parts.extend(insights.iter().map(|i| format!("• {}", i)));
            parts.push(String::new());
        }

        parts.push("**🔄 Action Required:**".to_string());
        parts.push("Please update this card with:".to_string());
        parts.push("• Current status and progress".to_string());
        parts.push("• Next steps and timeline".to_string());
        parts.push("• Any blockers or support needed".to_string());
        parts.push(String::new());
        parts.push("---".to_string());
        parts.push("*Auto-generated from Google Meet transcript analysis*".to_string());

        parts.join("\n")
    }
}

/// Pontos-chave do documento que citam palavras do nome do card
pub fn matching_key_points<'k>(card_name: &str, key_points: &'k [String]) -> Vec<&'k str> {
    let keywords: Vec<String> = tokenize(card_name)
        .into_iter()
        .filter(|w| w.chars().count() > 3)
        .collect();
    if keywords.is_empty() {
        return Vec::new();
    }

    key_points
        .iter()
        .filter(|p| {
            let lower = p.to_lowercase();
            keywords.iter().any(|k| lower.contains(k.as_str()))
        })
        .take(MAX_DOC_INSIGHTS)
        .map(String::as_str)
        .collect()
}

/// Resumo enviado ao grupo: notas do documento, resumo da IA ou texto padrão
pub fn group_summary(
    date: NaiveDate,
    notes: Option<&str>,
    ai_summary: Option<&MeetingSummary>,
    notes_max_chars: usize,
) -> String {
    let header = format!("🎯 Meeting Summary - {}", date.format("%d/%m/%Y"));

    if let Some(notes) = notes.map(str::trim).filter(|n| n.chars().count() > MIN_NOTES_CHARS) {
        return format!(
            "{}\n\n{}\n\n✅ Team members updated on action items",
            header,
            truncate_with_suffix(notes, notes_max_chars, "...")
        );
    }

    if let Some(summary) = ai_summary.filter(|s| !s.summary.trim().is_empty()) {
        let mut text = format!("{}\n\n{}", header, summary.summary.trim());
        if !summary.action_items.is_empty() {
            text.push_str("\n\n📋 Action items:");
            for item in &summary.action_items {
                text.push_str(&format!("\n• {}", item));
            }
        }
        text.push_str("\n\n✅ Trello cards updated with meeting notes");
        return text;
    }

    format!(
        "{}\n\n📋 Key topics discussed and action items assigned\n👥 Team members updated on their tasks\n\n✅ Trello cards updated with meeting notes",
        header
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssignmentSource;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    fn candidate(name: &str, confidence: u8) -> Assignment {
        Assignment {
            name: name.to_string(),
            whatsapp: None,
            source: AssignmentSource::LastCommenter,
            confidence,
            method: "last commenter".to_string(),
        }
    }

    #[test]
    fn test_comment_with_discussion() {
        let candidates = vec![candidate("Levy", 95), candidate("Wendy", 75), candidate("Lancey", 50)];
        let discussion = CardDiscussion {
            card_id: "c1".into(),
            card_name: "Organize Court Documents".into(),
            speakers: vec!["Levy Nkeng".into()],
            lines: vec!["Levy Nkeng: ok".into()],
            confidence: 85,
        };
        let key_points = vec![
            "Court documents are due Friday".to_string(),
            "Unrelated budget talk".to_string(),
        ];

        let text = MeetingComment {
            card_name: "Organize Court Documents",
            date: date(),
            candidates: &candidates,
            discussion: Some(&discussion),
            doc_key_points: &key_points,
        }
        .render();

        assert!(text.starts_with("📅 **Meeting Update - March 11, 2024**"));
        assert!(text.contains("🎯 **Levy** - last commenter (95% confidence)"));
        assert!(text.contains("📝 **Wendy**"));
        assert!(text.contains("💭 **Lancey**"));
        assert!(text.contains("**📌 Primary Assignee:** Levy"));
        assert!(text.contains("*Participants: Levy Nkeng*"));
        assert!(text.contains("• Levy Nkeng: ok"));
        assert!(text.contains("• Court documents are due Friday"));
        assert!(!text.contains("Unrelated budget talk"));
        assert!(text.contains("**🔄 Action Required:**"));
    }

    #[test]
    fn test_comment_without_discussion() {
        let text = MeetingComment {
            card_name: "Logo",
            date: date(),
            candidates: &[],
            discussion: None,
            doc_key_points: &[],
        }
        .render();

        assert!(text.contains("no specific discussion was captured"));
        assert!(!text.contains("Primary Assignee"));
        assert!(text.ends_with("*Auto-generated from Google Meet transcript analysis*"));
    }

    #[test]
    fn test_group_summary_prefers_notes() {
        let notes = "n".repeat(300);
        let text = group_summary(date(), Some(&notes), None, 250);
        assert!(text.starts_with("🎯 Meeting Summary - 11/03/2024\n\n"));
        assert!(text.contains(&format!("{}...", "n".repeat(250))));
        assert!(!text.contains(&"n".repeat(251)));
    }

    #[test]
    fn test_group_summary_fallbacks() {
        let ai = MeetingSummary {
            summary: "Reviewed the board.".into(),
            action_items: vec!["Levy: upload files".into()],
            ..Default::default()
        };
        let text = group_summary(date(), Some("short"), Some(&ai), 250);
        assert!(text.contains("Reviewed the board."));
        assert!(text.contains("• Levy: upload files"));

        let fixed = group_summary(date(), None, None, 250);
        assert!(fixed.contains("Key topics discussed and action items assigned"));
    }
}
