//! Detecção do responsável por um card
//!
//! Fontes, em ordem de confiança:
//! 1. Checklists de atribuição (95/90, +5 se o item estiver completo) e padrões
//!    em outras checklists (85)
//! 2. Último comentarista não-admin (95 por ID do membro, 80 por nome)
//! 3. Pedidos diretos na transcrição perto do nome do card (80)
//! 4. Padrões nos últimos 5 comentários (75)
//! 5. Membros do card mapeados para o time (75)
//! 6. Menções na descrição ou no nome do card (70)
//!
//! Sem candidatos, aplica as palavras-chave padrão do roster (60) e por fim um
//! membro de fallback escolhido pelo hash do ID do card (50).

use crate::config::{TeamDirectory, TeamMember};
use crate::models::{Assignment, AssignmentSource};
use trello::matching::{name_variations, normalize, tokenize};
use trello::{Card, CheckItemState, Checklist, CommentAction, MemberMapping};

const RECENT_COMMENTS: usize = 5;
const MIN_VARIATION_CHARS: usize = 3;
const TRANSCRIPT_CONTEXT_BEFORE: usize = 2;
const TRANSCRIPT_CONTEXT_AFTER: usize = 5;

/// Dados de um card usados na detecção
#[derive(Debug, Clone, Copy)]
pub struct AssignmentContext<'a> {
    pub card: &'a Card,
    pub checklists: &'a [Checklist],
    /// Do mais recente para o mais antigo
    pub comments: &'a [CommentAction],
    pub transcript: Option<&'a str>,
}

impl<'a> AssignmentContext<'a> {
    pub fn new(card: &'a Card) -> Self {
        Self {
            card,
            checklists: &[],
            comments: &[],
            transcript: None,
        }
    }

    pub fn with_checklists(mut self, checklists: &'a [Checklist]) -> Self {
        self.checklists = checklists;
        self
    }

    pub fn with_comments(mut self, comments: &'a [CommentAction]) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_transcript(mut self, transcript: &'a str) -> Self {
        self.transcript = Some(transcript);
        self
    }
}

/// Membro do roster com as grafias usadas para reconhecê-lo
struct Candidate<'a> {
    member: &'a TeamMember,
    variations: Vec<String>,
    member_id: Option<&'a str>,
}

/// `phrase` aparece em `text` sem letras coladas nas pontas
fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    text.match_indices(phrase).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + phrase.len()..].chars().next();
        let starts_clean = phrase.starts_with('@') || !before.is_some_and(char::is_alphanumeric);
        starts_clean && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Algum dos padrões (`{}` = nome) aparece no texto para alguma variação
fn any_pattern(text: &str, variations: &[String], patterns: &[&str]) -> bool {
    variations.iter().any(|v| {
        patterns
            .iter()
            .any(|p| contains_phrase(text, &p.replace("{}", v)))
    })
}

const CHECKLIST_PATTERNS: &[&str] = &[
    "@{}",
    "{} -",
    "{}:",
    "assigned to {}",
    "{} responsible",
    "{} handle",
];

const TRANSCRIPT_PATTERNS: &[&str] = &[
    "{}, can you",
    "{}, please",
    "{}, take",
    "{} can handle",
    "{} will work on",
    "{} is assigned",
    "assign this to {}",
    "assign {}",
    "{} should",
    "{}, you",
    "@{}",
];

const COMMENT_PATTERNS: &[&str] = &[
    "@{}",
    "assign this to {}",
    "assigned to {}",
    "{} please",
    "{} can you",
    "{} take this",
    "{} handle this",
];

const DESCRIPTION_PATTERNS: &[&str] = &["@{}", "@ {}", "{}", "assigned to {}"];

/// Hash estável do ID do card (não depende da versão do compilador)
fn stable_hash(text: &str) -> u64 {
    text.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

pub struct AssignmentDetector<'a> {
    team: &'a TeamDirectory,
    mapping: &'a MemberMapping,
}

impl<'a> AssignmentDetector<'a> {
    pub fn new(team: &'a TeamDirectory, mapping: &'a MemberMapping) -> Self {
        Self { team, mapping }
    }

    fn candidates(&self) -> Vec<Candidate<'a>> {
        self.team
            .members()
            .iter()
            .filter(|m| !self.team.is_admin_name(&m.name))
            .map(|member| {
                let mapped = self.mapping.find_by_team_name(&member.name);
                let mut variations: Vec<String> = Vec::new();
                let names = member
                    .all_names()
                    .map(String::as_str)
                    .chain(mapped.map(|m| m.trello_name.as_str()));
                for name in names {
                    for v in name_variations(name) {
                        if v.chars().count() >= MIN_VARIATION_CHARS && !variations.contains(&v) {
                            variations.push(v);
                        }
                    }
                }
                Candidate {
                    member,
                    variations,
                    member_id: mapped.map(|m| m.member_id.as_str()),
                }
            })
            .collect()
    }

    fn assignment(
        &self,
        member: &TeamMember,
        source: AssignmentSource,
        confidence: u8,
        method: impl Into<String>,
    ) -> Assignment {
        Assignment {
            name: member.name.clone(),
            whatsapp: member.whatsapp().map(str::to_string),
            source,
            confidence: confidence.min(100),
            method: method.into(),
        }
    }

    fn from_checklists(&self, ctx: &AssignmentContext, candidates: &[Candidate]) -> Vec<Assignment> {
        let mut found = Vec::new();

        for checklist in ctx.checklists {
            let assignment_list = checklist.is_assignment_list();
            let base = if checklist.name.to_lowercase().contains("assigned") {
                95
            } else {
                90
            };

            for item in &checklist.check_items {
                let text = normalize(&item.name);
                for candidate in candidates {
                    if assignment_list {
                        let by_id = candidate
                            .member_id
                            .is_some_and(|id| item.name.contains(id));
                        let by_name = candidate
                            .variations
                            .iter()
                            .any(|v| contains_phrase(&text, v) || contains_phrase(&text, &format!("@{}", v)));
                        if by_id || by_name {
                            let bonus = if item.state == CheckItemState::Complete { 5 } else { 0 };
                            found.push(self.assignment(
                                candidate.member,
                                AssignmentSource::Checklist,
                                base + bonus,
                                format!("checklist '{}'", checklist.name),
                            ));
                        }
                    } else if any_pattern(&text, &candidate.variations, CHECKLIST_PATTERNS) {
                        found.push(self.assignment(
                            candidate.member,
                            AssignmentSource::Checklist,
                            85,
                            format!("checklist item in '{}'", checklist.name),
                        ));
                    }
                }
            }
        }

        found
    }

    fn from_last_commenter(&self, ctx: &AssignmentContext) -> Option<Assignment> {
        let comment = ctx
            .comments
            .iter()
            .find(|c| !self.team.is_admin_name(c.author_name()))?;

        if let Some((mapped, how)) = self
            .mapping
            .resolve_commenter(comment.author_id(), comment.author_name())
        {
            let member = self.team.get(&mapped.team_name)?;
            return Some(self.assignment(
                member,
                AssignmentSource::LastCommenter,
                how.confidence(),
                format!("last commenter {}", comment.author_name()),
            ));
        }

        let member = self.team.resolve_full_name(comment.author_name())?;
        Some(self.assignment(
            member,
            AssignmentSource::LastCommenter,
            80,
            format!("last commenter {}", comment.author_name()),
        ))
    }

    fn from_transcript(&self, ctx: &AssignmentContext, candidates: &[Candidate]) -> Vec<Assignment> {
        let Some(transcript) = ctx.transcript else {
            return Vec::new();
        };
        let card_words: Vec<String> = tokenize(&ctx.card.name)
            .into_iter()
            .filter(|w| w.chars().count() > 3)
            .collect();
        if card_words.is_empty() {
            return Vec::new();
        }

        let lines: Vec<String> = transcript.lines().map(normalize).collect();
        let mut found: Vec<Assignment> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if !card_words.iter().any(|w| line.contains(w.as_str())) {
                continue;
            }
            let start = i.saturating_sub(TRANSCRIPT_CONTEXT_BEFORE);
            let end = (i + TRANSCRIPT_CONTEXT_AFTER + 1).min(lines.len());
            let context = lines[start..end].join("\n");

            for candidate in candidates {
                if found.iter().any(|a| a.name == candidate.member.name) {
                    continue;
                }
                if any_pattern(&context, &candidate.variations, TRANSCRIPT_PATTERNS) {
                    found.push(self.assignment(
                        candidate.member,
                        AssignmentSource::Transcript,
                        80,
                        "asked in meeting",
                    ));
                }
            }
        }

        found
    }

    fn from_comment_patterns(&self, ctx: &AssignmentContext, candidates: &[Candidate]) -> Vec<Assignment> {
        let recent: Vec<String> = ctx
            .comments
            .iter()
            .take(RECENT_COMMENTS)
            .map(|c| normalize(c.text()))
            .collect();

        candidates
            .iter()
            .filter(|c| {
                recent
                    .iter()
                    .any(|text| any_pattern(text, &c.variations, COMMENT_PATTERNS))
            })
            .map(|c| self.assignment(c.member, AssignmentSource::CommentPattern, 75, "mentioned in comments"))
            .collect()
    }

    fn from_card_members(&self, ctx: &AssignmentContext) -> Vec<Assignment> {
        ctx.card
            .id_members
            .iter()
            .filter_map(|id| self.mapping.get(id))
            .filter_map(|mapped| self.team.get(&mapped.team_name))
            .map(|member| self.assignment(member, AssignmentSource::CardMember, 75, "card member"))
            .collect()
    }

    fn from_description(&self, ctx: &AssignmentContext, candidates: &[Candidate]) -> Vec<Assignment> {
        let text = normalize(&format!("{}\n{}", ctx.card.name, ctx.card.desc));
        candidates
            .iter()
            .filter(|c| any_pattern(&text, &c.variations, DESCRIPTION_PATTERNS))
            .map(|c| self.assignment(c.member, AssignmentSource::Description, 70, "named in card"))
            .collect()
    }

    /// Todos os candidatos, um por membro (o de maior peso), do melhor para o pior
    pub fn detect_all(&self, ctx: &AssignmentContext) -> Vec<Assignment> {
        let candidates = self.candidates();

        let mut all = self.from_checklists(ctx, &candidates);
        all.extend(self.from_last_commenter(ctx));
        all.extend(self.from_transcript(ctx, &candidates));
        all.extend(self.from_comment_patterns(ctx, &candidates));
        all.extend(self.from_card_members(ctx));
        all.extend(self.from_description(ctx, &candidates));

        // Estável: em empate, a fonte que apareceu primeiro vence
        all.sort_by(|a, b| b.rank().cmp(&a.rank()));

        let mut unique: Vec<Assignment> = Vec::new();
        for assignment in all {
            if !unique.iter().any(|a| a.name == assignment.name) {
                unique.push(assignment);
            }
        }
        unique
    }

    /// Responsável do card: melhor candidato, regra padrão ou fallback
    pub fn detect(&self, ctx: &AssignmentContext) -> Option<Assignment> {
        if let Some(best) = self.detect_all(ctx).into_iter().next() {
            tracing::debug!(
                "👤 '{}' -> {} ({:?}, {}%)",
                ctx.card.name,
                best.name,
                best.source,
                best.confidence
            );
            return Some(best);
        }
        self.default_rule(ctx.card).or_else(|| self.fallback(ctx.card))
    }

    /// Primeiro membro cujas palavras-chave padrão aparecem no card
    pub fn default_rule(&self, card: &Card) -> Option<Assignment> {
        let content = normalize(&format!("{} {}", card.name, card.desc));
        self.team
            .members()
            .iter()
            .filter(|m| !self.team.is_admin_name(&m.name))
            .find_map(|member| {
                let keyword = member
                    .default_keywords
                    .iter()
                    .find(|k| !k.trim().is_empty() && content.contains(&normalize(k)))?;
                Some(self.assignment(
                    member,
                    AssignmentSource::DefaultRule,
                    60,
                    format!("default rule '{}'", keyword),
                ))
            })
    }

    /// Membro de fallback determinístico para o card
    pub fn fallback(&self, card: &Card) -> Option<Assignment> {
        let pool: Vec<&TeamMember> = self
            .team
            .members()
            .iter()
            .filter(|m| m.fallback && !self.team.is_admin_name(&m.name))
            .collect();
        if pool.is_empty() {
            return None;
        }
        let member = pool[(stable_hash(&card.id) % pool.len() as u64) as usize];
        Some(self.assignment(member, AssignmentSource::Fallback, 50, "fallback"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use trello::{map_board_members, CheckItem, Member};

    fn team() -> TeamDirectory {
        let mut wendy = TeamMember::new("Wendy", Some("237600000001".into()));
        wendy.default_keywords = vec!["design".into()];
        wendy.fallback = true;
        let mut lancey = TeamMember::new("Lancey", Some("237600000003".into()));
        lancey.aliases = vec!["Lancy".into()];
        lancey.fallback = true;
        let levy = TeamMember::new("Levy", Some("237600000002".into()));
        let criselle = TeamMember::new("Criselle", Some("237600000009".into()));
        TeamDirectory::new(vec![wendy, lancey, levy, criselle], vec!["Criselle".into()])
    }

    fn mapping(team: &TeamDirectory) -> MemberMapping {
        map_board_members(
            &[
                Member::new("m1", "Wendy Tamba"),
                Member::new("m2", "Lancy Dizon"),
                Member::new("m3", "Levy Nkeng"),
            ],
            &team.names(),
            team.admin_names(),
        )
    }

    fn comment(author_id: &str, author: &str, text: &str, hour: u32) -> CommentAction {
        serde_json::from_value(json!({
            "id": format!("a{}", hour),
            "date": Utc.with_ymd_and_hms(2024, 3, 11, hour, 0, 0).unwrap().to_rfc3339(),
            "memberCreator": {"id": author_id, "fullName": author, "username": ""},
            "data": {"text": text}
        }))
        .unwrap()
    }

    fn checklist(name: &str, items: &[(&str, CheckItemState)]) -> Checklist {
        Checklist {
            id: "cl".into(),
            name: name.into(),
            check_items: items
                .iter()
                .map(|(n, s)| CheckItem {
                    id: String::new(),
                    name: n.to_string(),
                    state: *s,
                })
                .collect(),
        }
    }

    #[test]
    fn test_contains_phrase_boundaries() {
        assert!(contains_phrase("ask levy to do it", "levy"));
        assert!(!contains_phrase("clevyland", "levy"));
        assert!(contains_phrase("ping @wendy.", "@wendy"));
    }

    #[test]
    fn test_assigned_checklist_wins() {
        let team = team();
        let mapping = mapping(&team);
        let card = Card::new("c1", "Mobile App Login Screen");
        let lists = vec![checklist("Assigned", &[("Lancy", CheckItemState::Complete)])];
        let comments = vec![comment("m1", "Wendy Tamba", "done with part one", 10)];
        let ctx = AssignmentContext::new(&card)
            .with_checklists(&lists)
            .with_comments(&comments);

        let detector = AssignmentDetector::new(&team, &mapping);
        let best = detector.detect(&ctx).unwrap();
        assert_eq!(best.name, "Lancey");
        assert_eq!(best.source, AssignmentSource::Checklist);
        assert_eq!(best.confidence, 100);

        let all = detector.detect_all(&ctx);
        assert_eq!(all[1].name, "Wendy");
        assert_eq!(all[1].confidence, 95);
    }

    #[test]
    fn test_other_checklist_patterns() {
        let team = team();
        let mapping = mapping(&team);
        let card = Card::new("c1", "Court Docs");
        let lists = vec![checklist("Steps", &[("scan folders - assigned to levy", CheckItemState::Incomplete)])];
        let ctx = AssignmentContext::new(&card).with_checklists(&lists);

        let best = AssignmentDetector::new(&team, &mapping).detect(&ctx).unwrap();
        assert_eq!(best.name, "Levy");
        assert_eq!(best.confidence, 85);
    }

    #[test]
    fn test_last_commenter_skips_admin() {
        let team = team();
        let mapping = mapping(&team);
        let card = Card::new("c1", "Court Docs");
        let comments = vec![
            comment("m9", "Criselle M.", "any update?", 12),
            comment("m3", "Levy Nkeng", "uploaded the files", 11),
        ];
        let ctx = AssignmentContext::new(&card).with_comments(&comments);

        let best = AssignmentDetector::new(&team, &mapping).detect(&ctx).unwrap();
        assert_eq!(best.name, "Levy");
        assert_eq!(best.source, AssignmentSource::LastCommenter);
        assert_eq!(best.confidence, 95);
        assert_eq!(best.whatsapp.as_deref(), Some("237600000002"));
    }

    #[test]
    fn test_transcript_request() {
        let team = team();
        let mapping = MemberMapping::default();
        let card = Card::new("c1", "Social Media Calendar");
        let transcript = "James: next is the social media calendar\nJames: Levy, can you take it this week?";
        let ctx = AssignmentContext::new(&card).with_transcript(transcript);

        let all = AssignmentDetector::new(&team, &mapping).detect_all(&ctx);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Levy");
        assert_eq!(all[0].source, AssignmentSource::Transcript);
    }

    #[test]
    fn test_card_members_and_description() {
        let team = team();
        let mapping = mapping(&team);
        let mut card = Card::new("c1", "Landing page");
        card.id_members = vec!["m1".into()];
        card.desc = "Copy review @levy".into();
        let all = AssignmentDetector::new(&team, &mapping).detect_all(&AssignmentContext::new(&card));

        assert_eq!(all[0].name, "Wendy");
        assert_eq!(all[0].source, AssignmentSource::CardMember);
        assert_eq!(all[1].name, "Levy");
        assert_eq!(all[1].source, AssignmentSource::Description);
    }

    #[test]
    fn test_default_rule_then_fallback() {
        let team = team();
        let mapping = MemberMapping::default();
        let detector = AssignmentDetector::new(&team, &mapping);

        let design = Card::new("c1", "Logo design refresh");
        let rule = detector.detect(&AssignmentContext::new(&design)).unwrap();
        assert_eq!(rule.name, "Wendy");
        assert_eq!(rule.source, AssignmentSource::DefaultRule);
        assert_eq!(rule.confidence, 60);

        let other = Card::new("c2", "Quarterly numbers");
        let first = detector.detect(&AssignmentContext::new(&other)).unwrap();
        let second = detector.detect(&AssignmentContext::new(&other)).unwrap();
        assert_eq!(first.source, AssignmentSource::Fallback);
        assert_eq!(first.confidence, 50);
        assert_eq!(first.name, second.name);
        assert!(["Wendy", "Lancey"].contains(&first.name.as_str()));
    }
}
