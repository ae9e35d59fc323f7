//! Estrutura da reunião: o facilitador lê o nome de cada card do board e o
//! time discute em seguida. Aqui a transcrição é cortada em trechos por card.

use crate::models::{CardDiscussion, DiscussionSummary};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use trello::matching::{normalize, sequence_ratio, tokenize};
use trello::Card;

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z\s'.]+?)\s*[-:]\s*(.+)$").expect("regex de segmento válida")
});

const NON_SPEAKERS: &[&str] = &[
    "meeting",
    "call",
    "video",
    "audio",
    "transcript",
    "recording",
    "summary",
];

const TRELLO_INDICATORS: &[&str] = &["trello", "cards", "board", "tasks"];

/// Confiança de um trecho aberto pelo facilitador
const FACILITATOR_READ_CONFIDENCE: u8 = 85;

const ACTION_PHRASES: &[&str] = &["will", "going to", "need to", "should", "must", "action"];
const KEY_PHRASES: &[&str] = &["important", "key", "main", "primary", "critical"];
const DECISION_PHRASES: &[&str] = &["decide", "agreed", "conclusion", "result"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub speaker: String,
    pub text: String,
}

/// Falas no formato `Nome: texto` ou `Nome - texto`
pub fn parse_segments(transcript: &str) -> Vec<Segment> {
    transcript
        .lines()
        .map(str::trim)
        .filter_map(|line| SEGMENT_RE.captures(line))
        .filter_map(|caps| {
            let speaker = caps[1].trim().to_string();
            if NON_SPEAKERS.contains(&speaker.to_lowercase().as_str()) {
                return None;
            }
            Some(Segment {
                speaker,
                text: caps[2].trim().to_string(),
            })
        })
        .collect()
}

/// Partes (com mais de 2 letras) dos nomes de facilitadores
fn facilitator_parts(facilitators: &[String]) -> Vec<String> {
    facilitators
        .iter()
        .flat_map(|f| tokenize(f))
        .filter(|p| p.chars().count() > 2)
        .collect()
}

fn is_facilitator(speaker: &str, parts: &[String]) -> bool {
    let speaker = normalize(speaker);
    parts.iter().any(|p| speaker.contains(p.as_str()))
}

/// Card que o facilitador está lendo nesta fala, se houver
pub fn match_card_reading<'a>(text: &str, cards: &'a [Card]) -> Option<&'a Card> {
    let text_lower = normalize(text);
    let text_words: Vec<&str> = text_lower.split_whitespace().collect();

    let mut best: Option<(&Card, f64)> = None;

    for card in cards {
        let name_lower = normalize(&card.name);
        if name_lower.is_empty() {
            continue;
        }

        let mut score = 0.0;

        if text_lower.contains(&name_lower) || name_lower.contains(&text_lower) {
            let ratio = sequence_ratio(text, &card.name);
            if ratio > 0.6 {
                score = ratio;
            }
        }

        let keywords: Vec<&str> = name_lower
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .collect();
        if !keywords.is_empty() {
            let hits = keywords
                .iter()
                .filter(|k| text_words.iter().any(|w| w.contains(*k)))
                .count();
            let keyword_score = hits as f64 / keywords.len() as f64;
            if keyword_score > 0.5 && keyword_score > score {
                score = keyword_score;
            }
        }

        if score > best.map(|(_, s)| s).unwrap_or(0.3) {
            best = Some((card, score));
        }
    }

    best.map(|(card, _)| card)
}

/// Corta a transcrição em discussões por card
///
/// A seção começa na primeira fala do facilitador que menciona o board.
/// Cada fala do facilitador que corresponde a um card abre uma nova discussão;
/// as falas seguintes se acumulam nela.
pub fn extract_card_discussions(
    transcript: &str,
    cards: &[Card],
    facilitators: &[String],
) -> Vec<CardDiscussion> {
    let parts = facilitator_parts(facilitators);
    let segments = parse_segments(transcript);

    let Some(start) = segments.iter().position(|s| {
        is_facilitator(&s.speaker, &parts) && {
            let text = s.text.to_lowercase();
            TRELLO_INDICATORS.iter().any(|i| text.contains(i))
        }
    }) else {
        tracing::debug!("Nenhuma seção de revisão do Trello encontrada na transcrição");
        return Vec::new();
    };

    let mut discussions: Vec<CardDiscussion> = Vec::new();
    let mut current: Option<(&Card, Vec<String>, BTreeSet<String>)> = None;

    let mut flush = |current: &mut Option<(&Card, Vec<String>, BTreeSet<String>)>| {
        if let Some((card, lines, speakers)) = current.take() {
            if lines.is_empty() {
                return;
            }
            // Um card lido duas vezes fica com a última discussão
            discussions.retain(|d| d.card_id != card.id);
            discussions.push(CardDiscussion {
                card_id: card.id.clone(),
                card_name: card.name.clone(),
                speakers: speakers.into_iter().collect(),
                lines,
                confidence: FACILITATOR_READ_CONFIDENCE,
            });
        }
    };

    for segment in &segments[start..] {
        if is_facilitator(&segment.speaker, &parts) {
            if let Some(card) = match_card_reading(&segment.text, cards) {
                flush(&mut current);
                tracing::debug!("Leitura de card: '{}' -> '{}'", segment.text, card.name);
                current = Some((card, Vec::new(), BTreeSet::new()));
                continue;
            }
        }

        if let Some((_, lines, speakers)) = current.as_mut() {
            lines.push(format!("{}: {}", segment.speaker, segment.text));
            speakers.insert(segment.speaker.clone());
        }
    }
    flush(&mut current);

    discussions
}

/// Até 3 pontos-chave e 3 ações de uma discussão
pub fn summarize_discussion(lines: &[String]) -> DiscussionSummary {
    if lines.len() <= 2 {
        return DiscussionSummary {
            key_points: lines.to_vec(),
            action_items: Vec::new(),
        };
    }

    let mut summary = DiscussionSummary::default();
    for line in lines {
        let lower = line.to_lowercase();
        if ACTION_PHRASES.iter().any(|p| lower.contains(p)) {
            summary.action_items.push(line.clone());
        } else if KEY_PHRASES.iter().any(|p| lower.contains(p))
            || DECISION_PHRASES.iter().any(|p| lower.contains(p))
        {
            summary.key_points.push(line.clone());
        }
    }
    summary.key_points.truncate(3);
    summary.action_items.truncate(3);

    if summary.key_points.is_empty() && summary.action_items.is_empty() {
        summary.key_points = lines
            .iter()
            .filter(|l| l.trim().chars().count() > 20)
            .take(3)
            .cloned()
            .collect();
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards() -> Vec<Card> {
        vec![
            Card::new("c1", "Mobile App Login Screen"),
            Card::new("c2", "Organize Court Documents"),
            Card::new("c3", "Social Media Calendar"),
        ]
    }

    fn facilitators() -> Vec<String> {
        vec!["James Taylor".to_string()]
    }

    const MEETING: &str = "\
James Taylor: Morning all, quick check-in first.
Wendy Tamba: All good here.
James Taylor: Alright, let's go through our Trello board now.
James Taylor: Mobile app login screen.
Breyden Cole: I fixed the token refresh, it's important for release.
Wendy Tamba: I will test it tomorrow.
James Taylor: Organize court documents.
Levy Nkeng: I need to finish the last folder.
Recording - paused
James Taylor: Thanks everyone.
";

    #[test]
    fn test_parse_segments_skips_non_speakers() {
        let segments = parse_segments(MEETING);
        assert!(segments.iter().all(|s| s.speaker != "Recording"));
        assert_eq!(segments[0].speaker, "James Taylor");
        assert_eq!(segments[0].text, "Morning all, quick check-in first.");
    }

    #[test]
    fn test_match_card_reading() {
        let cards = cards();
        assert_eq!(match_card_reading("Mobile app login screen.", &cards).unwrap().id, "c1");
        assert_eq!(match_card_reading("Next is the court documents one", &cards).unwrap().id, "c2");
        assert!(match_card_reading("Thanks everyone.", &cards).is_none());
    }

    #[test]
    fn test_extract_card_discussions() {
        let discussions = extract_card_discussions(MEETING, &cards(), &facilitators());
        assert_eq!(discussions.len(), 2);

        let mobile = &discussions[0];
        assert_eq!(mobile.card_id, "c1");
        assert_eq!(mobile.speakers, vec!["Breyden Cole", "Wendy Tamba"]);
        assert_eq!(mobile.lines.len(), 2);
        assert_eq!(mobile.confidence, 85);

        let court = &discussions[1];
        assert_eq!(court.card_id, "c2");
        assert_eq!(court.lines[0], "Levy Nkeng: I need to finish the last folder.");
        assert_eq!(court.lines.len(), 2);
    }

    #[test]
    fn test_no_trello_section() {
        let text = "Wendy: hello\nJames Taylor: see you tomorrow";
        assert!(extract_card_discussions(text, &cards(), &facilitators()).is_empty());
    }

    #[test]
    fn test_summarize_discussion() {
        let lines: Vec<String> = vec![
            "Breyden: The key blocker is the API key.".into(),
            "Wendy: I will test it tomorrow.".into(),
            "Levy: ok".into(),
        ];
        let summary = summarize_discussion(&lines);
        assert_eq!(summary.key_points, vec!["Breyden: The key blocker is the API key."]);
        assert_eq!(summary.action_items, vec!["Wendy: I will test it tomorrow."]);

        let short = summarize_discussion(&["A: hi".to_string()]);
        assert_eq!(short.key_points, vec!["A: hi"]);
    }
}
