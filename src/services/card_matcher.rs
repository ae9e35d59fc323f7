//! Identificação dos cards do Trello discutidos numa reunião
//!
//! Estratégias, em ordem de preferência:
//!
//! 1. Itens da seção "Trello Board Review" das notas ([`match_notes_to_cards`])
//! 2. Pontuação por conteúdo ([`match_by_content`])
//! 3. IA, quando configurada, e palavras-chave como último recurso
//! 4. Composite (janela deslizante), sempre mesclado ao resultado

use crate::models::{CardMatch, DocContent, MatchType};
use aho_corasick::{AhoCorasick, MatchKind};
use ia_service::{CardContext, IaService};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use trello::matching::{jaccard_overlap, normalize, sequence_ratio, significant_words};
use trello::Card;

/// Máximo de cards devolvidos pelo pipeline
pub const MAX_MATCHES: usize = 15;

const NOTES_MIN_SCORE: f64 = 40.0;
const NOTES_MIN_ITEM_CHARS: usize = 10;
const CONTENT_MIN_SCORE: f64 = 30.0;
const KEYWORD_MIN_SCORE: f64 = 25.0;
const KEYWORD_MAX_MATCHES: usize = 10;
const COMPOSITE_MIN_SCORE: f64 = 0.4;
const COMPOSITE_CONTEXT_BONUS: f64 = 0.15;

const NOTES_SKIP_TERMS: &[&str] = &[
    "trello",
    "board",
    "review",
    "task",
    "assignment",
    "---",
    "===",
    "section",
];

const NOTES_TASK_KEYWORDS: &[&str] = &[
    "organize",
    "create",
    "update",
    "fix",
    "build",
    "center",
    "mobile",
    "app",
    "wordpress",
    "court",
    "document",
];

const NOTES_KEY_TERMS: &[&str] = &[
    "mobile",
    "app",
    "court",
    "document",
    "wordpress",
    "center",
    "organize",
];

const TASK_VERBS: &[&str] = &[
    "organize", "create", "update", "fix", "build", "improve", "add", "upload",
];

const CONTEXT_PHRASES: &[&str] = &["working on", "need to", "update", "status", "task", "card"];

/// Grupos de palavras-chave de projeto: (nome, termos)
const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    ("mobile", &["mobile", "app", "ios", "android", "flutter", "react native"]),
    (
        "web",
        &["website", "web", "wordpress", "landing", "page", "frontend", "html", "css"],
    ),
    (
        "court",
        &["court", "legal", "document", "evidence", "case", "organize"],
    ),
    (
        "center",
        &["center", "centre", "vitality", "quantum", "healing", "energy"],
    ),
    ("eesystem", &["eesystem", "ee system", "scalar", "wellness"]),
    ("design", &["design", "logo", "brand", "graphics", "visual"]),
    ("funnel", &["funnel", "landing", "page", "ghl", "gohighlevel"]),
    (
        "calendar",
        &["calendar", "schedule", "booking", "appointment"],
    ),
    (
        "social",
        &["social", "media", "facebook", "instagram", "marketing"],
    ),
];

/// Automato com todos os termos; `KEYWORD_TERM_GROUP[i]` é o grupo do padrão `i`
static KEYWORD_AUTOMATON: Lazy<AhoCorasick> = Lazy::new(|| {
    let terms: Vec<&str> = KEYWORD_GROUPS
        .iter()
        .flat_map(|(_, terms)| terms.iter().copied())
        .collect();
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::Standard)
        .build(terms)
        .expect("automato de palavras-chave válido")
});

static KEYWORD_TERM_GROUP: Lazy<Vec<usize>> = Lazy::new(|| {
    KEYWORD_GROUPS
        .iter()
        .enumerate()
        .flat_map(|(group, (_, terms))| std::iter::repeat(group).take(terms.len()))
        .collect()
});

/// Índices dos grupos de palavras-chave presentes no texto
fn keyword_groups_in(text: &str) -> HashSet<usize> {
    KEYWORD_AUTOMATON
        .find_overlapping_iter(text)
        .map(|m| KEYWORD_TERM_GROUP[m.pattern().as_usize()])
        .collect()
}

fn candidate_cards(cards: &[Card]) -> impl Iterator<Item = &Card> {
    cards.iter().filter(|c| !c.closed && !c.is_meta_card())
}

fn card_match(card: &Card, confidence: f64, match_type: MatchType, reason: String) -> CardMatch {
    CardMatch {
        card_id: card.id.clone(),
        card_name: card.name.clone(),
        card_url: card.url.clone(),
        confidence: confidence.min(100.0),
        match_type,
        reason,
        notes_reference: None,
    }
}

fn sort_by_confidence(matches: &mut [CardMatch]) {
    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

static NUMBERED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("regex de item numerado válida"));

fn strip_item_prefix(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix('•')
        .or_else(|| line.strip_prefix('-'))
        .or_else(|| line.strip_prefix('*'))
    {
        return rest.trim();
    }
    match NUMBERED_PREFIX.find(line) {
        Some(prefix) => line[prefix.end()..].trim(),
        None => line,
    }
}

/// Itens de tarefa da seção de revisão do board
pub fn extract_cards_from_notes(review_text: &str) -> Vec<String> {
    let mut items = Vec::new();

    for line in review_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if NOTES_SKIP_TERMS.iter().any(|t| lower.contains(t)) {
            continue;
        }

        let is_bullet = line.starts_with('•') || line.starts_with('-') || line.starts_with('*');
        let has_number = line.starts_with(|c: char| c.is_ascii_digit());
        let has_keyword = NOTES_TASK_KEYWORDS.iter().any(|k| lower.contains(k));
        if !(is_bullet || has_number || has_keyword) {
            continue;
        }

        let item = strip_item_prefix(line);
        if item.chars().count() > NOTES_MIN_ITEM_CHARS {
            items.push(item.to_string());
        }
    }

    items
}

/// Casa cada item das notas com o card mais parecido
pub fn match_notes_to_cards(notes_items: &[String], cards: &[Card]) -> Vec<CardMatch> {
    let mut matches = Vec::new();

    for item in notes_items {
        let item_lower = item.to_lowercase();
        let item_words = significant_words(item, 2);

        let mut best: Option<(&Card, f64)> = None;
        for card in candidate_cards(cards) {
            let name_lower = card.name.to_lowercase();
            let mut score = jaccard_overlap(&item_words, &significant_words(&card.name, 2)) * 100.0;

            if !name_lower.is_empty()
                && (item_lower.contains(&name_lower) || name_lower.contains(&item_lower))
            {
                score += 50.0;
            }

            score += NOTES_KEY_TERMS
                .iter()
                .filter(|t| item_lower.contains(*t) && name_lower.contains(*t))
                .count() as f64
                * 20.0;

            if score > best.map(|(_, s)| s).unwrap_or(0.0) {
                best = Some((card, score));
            }
        }

        if let Some((card, score)) = best.filter(|(_, s)| *s >= NOTES_MIN_SCORE) {
            tracing::debug!("📝 Notas '{}' -> '{}' ({:.0})", item, card.name, score);
            let mut m = card_match(
                card,
                score,
                MatchType::NotesToTrello,
                format!("Listed in meeting notes: {}", item),
            );
            m.notes_reference = Some(item.clone());
            matches.push(m);
        }
    }

    merge_matches(matches)
}

/// Pontuação por conteúdo sem IA
pub fn match_by_content(text: &str, cards: &[Card]) -> Vec<CardMatch> {
    let text_lower = text.to_lowercase();
    let text_words: HashSet<&str> = text_lower.split_whitespace().collect();
    let text_groups = keyword_groups_in(&text_lower);
    let text_has_verb = TASK_VERBS.iter().any(|v| text_lower.contains(v));

    let mut matches = Vec::new();

    for card in candidate_cards(cards) {
        let name_lower = card.name.to_lowercase();
        if name_lower.trim().is_empty() {
            continue;
        }
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if text_lower.contains(&name_lower) {
            score += 80.0;
            reasons.push("full name mentioned".to_string());
        }

        let card_words: Vec<&str> = name_lower
            .split_whitespace()
            .filter(|w| w.chars().count() > 2)
            .collect();
        if !card_words.is_empty() {
            let overlap = card_words.iter().filter(|w| text_words.contains(*w)).count();
            if overlap > 0 {
                score += overlap as f64 / card_words.len() as f64 * 60.0;
                reasons.push(format!("{}/{} words", overlap, card_words.len()));
            }
        }

        let shared_groups: Vec<&str> = keyword_groups_in(&name_lower)
            .intersection(&text_groups)
            .map(|g| KEYWORD_GROUPS[*g].0)
            .collect();
        if !shared_groups.is_empty() {
            score += shared_groups.len() as f64 * 40.0;
            reasons.push(format!("topics: {}", shared_groups.join(", ")));
        }

        let long_hits = name_lower
            .split_whitespace()
            .filter(|w| w.chars().count() > 4 && text_lower.contains(*w))
            .count();
        score += long_hits as f64 * 25.0;

        if text_has_verb && TASK_VERBS.iter().any(|v| name_lower.contains(v)) {
            score += 20.0;
        }

        if score >= CONTENT_MIN_SCORE {
            matches.push(card_match(card, score, MatchType::Content, reasons.join("; ")));
        }
    }

    sort_by_confidence(&mut matches);
    matches.truncate(MAX_MATCHES);
    matches
}

/// Último recurso: nome e palavras do card presentes no texto
pub fn match_by_keywords(text: &str, cards: &[Card], exclude: &HashSet<String>) -> Vec<CardMatch> {
    let text_lower = text.to_lowercase();
    let text_words: Vec<&str> = text_lower.split_whitespace().collect();
    let mut matches = Vec::new();

    for card in candidate_cards(cards).filter(|c| !exclude.contains(&c.id)) {
        let name_lower = card.name.to_lowercase();
        if name_lower.trim().is_empty() {
            continue;
        }
        let mut score = 0.0;

        if text_lower.contains(&name_lower) {
            score += 70.0;
        }

        for word in name_lower.split_whitespace().filter(|w| w.chars().count() > 2) {
            if text_lower.contains(word) {
                score += 15.0;
            } else if word.chars().count() > 4
                && text_words.iter().any(|t| t.contains(word) || word.contains(t))
            {
                score += 8.0;
            }
        }

        if score >= KEYWORD_MIN_SCORE {
            matches.push(card_match(
                card,
                score,
                MatchType::KeywordFallback,
                "Card keywords found in transcript".to_string(),
            ));
        } else if score > 0.0 {
            tracing::debug!("Baixa confiança: '{}' ({:.0})", card.name, score);
        }
    }

    sort_by_confidence(&mut matches);
    matches.truncate(KEYWORD_MAX_MATCHES);
    matches
}

/// Maior similaridade entre o nome e qualquer janela de palavras do texto
///
/// Só janelas que compartilham alguma palavra com o nome são comparadas.
fn best_window_ratio(lines: &[Vec<String>], name_words: &[String]) -> f64 {
    let size = name_words.len();
    if size == 0 {
        return 0.0;
    }
    let name = name_words.join(" ");
    let mut best: f64 = 0.0;

    for words in lines.iter().filter(|w| w.len() >= size) {
        for window in words.windows(size) {
            if !window.iter().any(|w| name_words.contains(w)) {
                continue;
            }
            best = best.max(sequence_ratio(&window.join(" "), &name));
        }
    }
    best
}

fn coverage(words: &HashSet<String>, text_words: &HashSet<String>) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    words.iter().filter(|w| text_words.contains(*w)).count() as f64 / words.len() as f64
}

/// Similaridade composta (0.0 a 1.0) por janela deslizante, palavras e descrição
pub fn match_composite(text: &str, cards: &[Card]) -> Vec<CardMatch> {
    let normalized = normalize(text);
    let lines: Vec<Vec<String>> = text
        .lines()
        .map(|l| normalize(l).split_whitespace().map(str::to_string).collect())
        .collect();
    let text_words: HashSet<String> = lines.iter().flatten().cloned().collect();
    let lower_lines: Vec<String> = text.lines().map(str::to_lowercase).collect();

    let mut matches = Vec::new();

    for card in candidate_cards(cards) {
        let name = normalize(&card.name);
        let name_words: Vec<String> = name.split_whitespace().map(str::to_string).collect();
        if name_words.is_empty() {
            continue;
        }

        let name_significant = significant_words(&name, 2);
        let substring: f64 = if normalized.contains(&name) { 1.0 } else { 0.0 };
        let window = best_window_ratio(&lines, &name_words);
        let words = coverage(&name_significant, &text_words);
        let description = coverage(&significant_words(&normalize(&card.desc), 3), &text_words) * 0.7;

        let mut score = substring.max(window).max(words).max(description);
        if score <= 0.0 {
            continue;
        }

        let has_context = lower_lines.iter().any(|line| {
            name_significant.iter().any(|w| line.contains(w.as_str()))
                && CONTEXT_PHRASES.iter().any(|p| line.contains(p))
        });
        if has_context {
            score += COMPOSITE_CONTEXT_BONUS;
        }
        let score = score.min(1.0);

        if score < COMPOSITE_MIN_SCORE {
            continue;
        }

        let match_type = if score >= 0.9 {
            MatchType::Exact
        } else if score >= 0.6 {
            MatchType::Fuzzy
        } else {
            MatchType::Partial
        };

        matches.push(card_match(
            card,
            score * 100.0,
            match_type,
            format!(
                "name {:.2}, window {:.2}, words {:.2}, description {:.2}",
                substring, window, words, description
            ),
        ));
    }

    sort_by_confidence(&mut matches);
    matches
}

/// Remove duplicados (mantém a maior confiança) e ordena
pub fn merge_matches(matches: Vec<CardMatch>) -> Vec<CardMatch> {
    let mut best: HashMap<String, CardMatch> = HashMap::new();
    for m in matches {
        let replace = best
            .get(&m.card_id)
            .map_or(true, |existing| m.confidence > existing.confidence);
        if replace {
            best.insert(m.card_id.clone(), m);
        }
    }
    let mut merged: Vec<CardMatch> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.card_name.cmp(&b.card_name))
    });
    merged
}

/// Texto usado pela pontuação por conteúdo: transcrição, notas e documento
fn combined_text(transcript: &str, doc: Option<&DocContent>) -> String {
    match doc {
        Some(doc) => format!("{}\n{}\n{}", transcript, doc.notes, doc.raw_text),
        None => transcript.to_string(),
    }
}

async fn match_with_ai(ai: &IaService, transcript: &str, cards: &[Card]) -> Vec<CardMatch> {
    let contexts: Vec<CardContext> = candidate_cards(cards)
        .map(|c| CardContext {
            id: c.id.clone(),
            name: c.name.clone(),
            description: c.short_description(200),
        })
        .collect();

    match ai.match_cards(transcript, &contexts).await {
        Ok(ai_matches) => ai_matches
            .into_iter()
            .filter_map(|m| {
                let card = cards.iter().find(|c| c.id == m.card_id)?;
                Some(card_match(card, m.confidence, MatchType::Ai, m.reason))
            })
            .collect(),
        Err(e) => {
            tracing::warn!("⚠️ Matching por IA falhou, usando palavras-chave: {}", e);
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardMatcher;

impl CardMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Pipeline completo de matching
    pub async fn find_matches(
        &self,
        transcript: &str,
        doc: Option<&DocContent>,
        cards: &[Card],
        ai: Option<&IaService>,
    ) -> Vec<CardMatch> {
        let mut matches = match doc.filter(|d| d.has_board_review()) {
            Some(doc) => {
                let items = extract_cards_from_notes(&doc.trello_board_review);
                tracing::info!("📝 {} itens na revisão do board", items.len());
                match_notes_to_cards(&items, cards)
            }
            None => match_by_content(&combined_text(transcript, doc), cards),
        };

        if matches.is_empty() {
            if let Some(ai) = ai {
                matches = match_with_ai(ai, transcript, cards).await;
            }
            if matches.is_empty() {
                tracing::info!("🔎 Usando matching por palavras-chave");
                matches = match_by_keywords(transcript, cards, &HashSet::new());
            }
        }

        matches.extend(match_composite(transcript, cards));

        let mut merged = merge_matches(matches);
        merged.truncate(MAX_MATCHES);
        tracing::info!("🎯 {} cards identificados", merged.len());
        merged
    }
}
