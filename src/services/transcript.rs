//! Análise de transcrições sem IA: participantes, action items, duração,
//! métricas por falante e feedback de participação

use crate::models::{
    ActionItem, DocContent, EngagementLevel, MeetingAnalysis, ParticipantFeedback, SpeakerMetrics,
};
use crate::utils::{title_case, word_count};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use trello::members::is_admin_name;

static SPEAKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z\s]+?):\s*(.+)$").expect("regex de falante válida"));

static ACTION_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\w+)\s+(?:will|should|must)\s+([^.!?]+)",
        r"(?i)(\w+)\s+is\s+going\s+to\s+([^.!?]+)",
        r"(?i)(\w+)\s+can\s+(?:take|handle)\s+([^.!?]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("regex de action item válida"))
    .collect()
});

static TRELLO_START_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)let'?s\s+(?:look\s+at|go\s+through|check)\s+(?:the\s+)?trello",
        r"(?i)trello\s+board",
        r"(?i)going\s+through\s+(?:the\s+)?cards",
        r"(?i)(?:first|next)\s+card",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("regex de início do trello válida"))
    .collect()
});

const PARTICIPANT_SCAN_LINES: usize = 50;
const MAX_PARTICIPANTS: usize = 10;
const ACTION_SCAN_LINES: usize = 100;
const MAX_ACTION_ITEMS: usize = 10;
const WORDS_PER_MINUTE: usize = 150;
const MAX_KEY_DISCUSSIONS: usize = 5;

const TOPIC_MARKERS: &[&str] = &["discuss", "talk about", "review", "look at"];
const DECISION_MARKERS: &[&str] = &["decided", "agreed", "resolved", "concluded"];
const ACTION_MARKERS: &[&str] = &["will do", "next step", "follow up", "action"];
const DECISION_WORDS: &[&str] = &["decide", "agree", "resolve", "conclude"];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Falantes nas primeiras 50 linhas (`Nome: fala`), ordenados
pub fn extract_participants(text: &str) -> Vec<String> {
    let mut participants = BTreeSet::new();

    for line in text.lines().take(PARTICIPANT_SCAN_LINES).map(str::trim) {
        if let Some(caps) = SPEAKER_RE.captures(line) {
            let speaker = caps[1].trim();
            if speaker.chars().count() <= 20 {
                participants.insert(title_case(speaker));
            }
        }
        if participants.len() >= MAX_PARTICIPANTS {
            break;
        }
    }

    participants.into_iter().collect()
}

/// Frases do tipo "X will ...", "X is going to ...", "X can take ..."
pub fn extract_action_items(text: &str) -> Vec<ActionItem> {
    let mut items = Vec::new();

    for line in text.lines().take(ACTION_SCAN_LINES).map(str::trim) {
        if line.is_empty() {
            continue;
        }
        for re in ACTION_RES.iter() {
            for caps in re.captures_iter(line) {
                items.push(ActionItem {
                    assignee: title_case(&caps[1]),
                    task: caps[2].trim().to_string(),
                });
            }
        }
        if items.len() >= MAX_ACTION_ITEMS {
            break;
        }
    }

    items.truncate(MAX_ACTION_ITEMS);
    items
}

/// Minutos estimados (150 palavras/minuto, mínimo 5)
pub fn estimate_minutes(text: &str) -> usize {
    std::cmp::max(5, word_count(text) / WORDS_PER_MINUTE)
}

/// "25m" ou "1h 10m"
pub fn estimate_duration(text: &str) -> String {
    let minutes = estimate_minutes(text);
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Métricas por falante, ordenadas por volume de fala
pub fn speaker_metrics(text: &str) -> Vec<SpeakerMetrics> {
    let mut order: Vec<String> = Vec::new();
    let mut metrics: HashMap<String, SpeakerMetrics> = HashMap::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.contains('[') {
            continue;
        }
        let Some((speaker, message)) = line.split_once(':') else {
            continue;
        };
        let speaker = speaker.trim();
        if speaker.is_empty() || speaker.chars().count() >= 50 {
            continue;
        }

        let entry = metrics.entry(speaker.to_string()).or_insert_with(|| {
            order.push(speaker.to_string());
            SpeakerMetrics {
                speaker: speaker.to_string(),
                word_count: 0,
                message_count: 0,
                avg_message_length: 0.0,
                questions: 0,
                decisions: 0,
                participation_pct: 0.0,
                engagement_score: 0,
            }
        });

        let message = message.trim();
        entry.word_count += word_count(message);
        entry.message_count += 1;
        if message.contains('?') {
            entry.questions += 1;
        }
        if contains_any(&message.to_lowercase(), DECISION_WORDS) {
            entry.decisions += 1;
        }
    }

    let total_words: usize = metrics.values().map(|m| m.word_count).sum();

    let mut result: Vec<SpeakerMetrics> = order
        .into_iter()
        .filter_map(|speaker| metrics.remove(&speaker))
        .map(|mut m| {
            if m.message_count > 0 {
                m.avg_message_length = round1(m.word_count as f64 / m.message_count as f64);
            }
            if total_words > 0 {
                m.participation_pct = round1(m.word_count as f64 * 100.0 / total_words as f64);
            }
            let engagement = (m.participation_pct * 2.0).min(40.0)
                + (m.questions as f64 * 10.0).min(30.0)
                + (m.decisions as f64 * 15.0).min(30.0);
            m.engagement_score = (engagement.round() as u32).min(100);
            m
        })
        .collect();

    result.sort_by(|a, b| b.word_count.cmp(&a.word_count));
    result
}

/// Pontos fortes e sugestões por participante (admins ficam de fora)
pub fn participant_feedback(
    metrics: &[SpeakerMetrics],
    admin_names: &[String],
) -> Vec<ParticipantFeedback> {
    metrics
        .iter()
        .filter(|m| !is_admin_name(&m.speaker, admin_names))
        .map(|m| {
            let mut strengths = Vec::new();
            let mut improvements = Vec::new();

            if m.participation_pct > 25.0 {
                strengths.push("Active participation in discussions".to_string());
            }
            if m.questions > 2 {
                strengths.push("Good questioning and curiosity".to_string());
            }
            if m.decisions > 0 {
                strengths.push("Contributing to decision-making".to_string());
            }
            if m.avg_message_length > 15.0 {
                strengths.push("Providing detailed explanations".to_string());
            }

            if m.participation_pct < 10.0 {
                improvements.push("Increase participation in discussions".to_string());
            }
            if m.questions == 0 {
                improvements.push("Ask more clarifying questions".to_string());
            }
            if m.avg_message_length < 5.0 {
                improvements.push("Provide more detailed responses".to_string());
            }
            if m.participation_pct > 50.0 {
                improvements.push("Allow others more speaking time".to_string());
            }

            ParticipantFeedback {
                speaker: m.speaker.clone(),
                engagement_level: EngagementLevel::from_score(m.engagement_score),
                engagement_score: m.engagement_score,
                strengths,
                improvements,
            }
        })
        .collect()
}

/// Offset (em bytes) do início da revisão do board na transcrição
pub fn find_trello_discussion_start(text: &str) -> Option<usize> {
    TRELLO_START_RES
        .iter()
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min()
}

/// Análise completa de uma transcrição, enriquecida pelo documento quando houver
pub fn analyze_meeting(
    text: &str,
    doc: Option<&DocContent>,
    admin_names: &[String],
) -> MeetingAnalysis {
    let mut key_discussions = Vec::new();
    let mut current_topic = String::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.contains('[') {
            continue;
        }
        if contains_any(&line.to_lowercase(), TOPIC_MARKERS) {
            if !current_topic.is_empty() {
                key_discussions.push(std::mem::take(&mut current_topic));
            }
            current_topic = line.to_string();
        } else if !current_topic.is_empty() {
            current_topic.push(' ');
            current_topic.push_str(line);
        }
    }
    if !current_topic.is_empty() {
        key_discussions.push(current_topic);
    }
    key_discussions.truncate(MAX_KEY_DISCUSSIONS);

    let mut decisions = Vec::new();
    let mut action_lines = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if contains_any(&lower, DECISION_MARKERS) {
            decisions.push(line.to_string());
        } else if contains_any(&lower, ACTION_MARKERS) {
            action_lines.push(line.to_string());
        }
    }

    let mut objectives = Vec::new();
    let mut key_points = Vec::new();
    if let Some(doc) = doc {
        objectives = doc.objectives.clone();
        key_points = doc.key_points.clone();
        decisions.extend(doc.decisions.iter().take(3).cloned());
        action_lines.extend(doc.action_items.iter().take(5).cloned());
        key_discussions.extend(doc.key_points.iter().take(3).cloned());
    }

    let metrics = speaker_metrics(text);
    let feedback = participant_feedback(&metrics, admin_names);

    MeetingAnalysis {
        participants: extract_participants(text),
        key_discussions,
        decisions,
        action_lines,
        objectives,
        key_points,
        action_items: extract_action_items(text),
        duration: estimate_duration(text),
        word_count: word_count(text),
        speaker_metrics: metrics,
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "\
James Taylor: Good morning everyone, let's review the week.
Wendy Tamba: Morning! I finished the funnel copy.
Levy Nkeng: Should we decide on the court documents layout today?
James Taylor: Yes, we agreed to use the new folder structure.
[Recording stopped briefly]
Levy Nkeng: Levy will organize the court documents by Friday.
Wendy Tamba: Sounds good.
";

    #[test]
    fn test_extract_participants() {
        assert_eq!(
            extract_participants(TRANSCRIPT),
            vec!["James Taylor", "Levy Nkeng", "Wendy Tamba"]
        );
        assert!(extract_participants("no speakers here").is_empty());
    }

    #[test]
    fn test_extract_action_items() {
        let items = extract_action_items("Levy will organize the court documents by Friday. Wendy is going to fix the app.");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].assignee, "Levy");
        assert_eq!(items[0].task, "organize the court documents by Friday");
        assert_eq!(items[1].assignee, "Wendy");
        assert_eq!(items[1].task, "fix the app");
    }

    #[test]
    fn test_estimate_duration() {
        assert_eq!(estimate_duration("a few words"), "5m");
        assert_eq!(estimate_duration(&"word ".repeat(150 * 30)), "30m");
        assert_eq!(estimate_duration(&"word ".repeat(150 * 75)), "1h 15m");
    }

    #[test]
    fn test_speaker_metrics() {
        let metrics = speaker_metrics(TRANSCRIPT);
        assert_eq!(metrics.len(), 3);

        let levy = metrics.iter().find(|m| m.speaker == "Levy Nkeng").unwrap();
        assert_eq!(levy.message_count, 2);
        assert_eq!(levy.questions, 1);
        assert_eq!(levy.decisions, 1);

        let total: f64 = metrics.iter().map(|m| m.participation_pct).sum();
        assert!((total - 100.0).abs() < 0.5);
        assert!(metrics.iter().all(|m| m.engagement_score <= 100));
    }

    #[test]
    fn test_participant_feedback_skips_admins() {
        let metrics = speaker_metrics(TRANSCRIPT);
        let feedback = participant_feedback(&metrics, &["James".to_string()]);
        assert_eq!(feedback.len(), 2);
        assert!(feedback.iter().all(|f| f.speaker != "James Taylor"));

        let wendy = feedback.iter().find(|f| f.speaker == "Wendy Tamba").unwrap();
        assert!(wendy.improvements.contains(&"Ask more clarifying questions".to_string()));
    }

    #[test]
    fn test_find_trello_discussion_start() {
        let text = "Intro chat.\nJames: Let's go through the Trello board now.\nNext card please.";
        let start = find_trello_discussion_start(text).unwrap();
        assert!(text[start..].starts_with("Let's go through the Trello"));
        assert!(find_trello_discussion_start("nothing relevant").is_none());
    }

    #[test]
    fn test_analyze_meeting_merges_doc() {
        let doc = DocContent {
            decisions: vec!["Use new folders".to_string()],
            objectives: vec!["Close sprint".to_string()],
            key_points: vec!["Funnel copy done".to_string()],
            ..Default::default()
        };

        let analysis = analyze_meeting(TRANSCRIPT, Some(&doc), &[]);
        assert_eq!(analysis.participants.len(), 3);
        assert!(analysis.key_discussions[0].starts_with("James Taylor: Good morning everyone, let's review"));
        assert!(analysis.decisions.iter().any(|d| d.contains("we agreed")));
        assert!(analysis.decisions.contains(&"Use new folders".to_string()));
        assert_eq!(analysis.objectives, vec!["Close sprint"]);
        assert!(analysis.key_discussions.contains(&"Funnel copy done".to_string()));
        assert_eq!(analysis.duration, "5m");
        assert_eq!(analysis.feedback.len(), 3);
    }
}
