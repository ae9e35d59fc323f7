//! Scan de cards em andamento que precisam de atualização do responsável
//!
//! Um card precisa de atualização quando o responsável não comentou nele dentro
//! da janela configurada (24h por padrão) com algo que pareça um status.

use crate::config::settings::TrackerSettings;
use crate::config::TeamDirectory;
use crate::models::{Assignment, CardUpdateStatus, Priority, ScanOptions, ScanReport};
use crate::services::assignment::{AssignmentContext, AssignmentDetector};
use crate::services::reminder_tracker::ReminderTracker;
use crate::utils::logging::log_scan_summary;
use crate::utils::AppResult;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use trello::matching::{names_match, normalize};
use trello::{map_board_members, BoardList, BoardService, Card, Checklist, CommentAction, MemberMapping};

const COMMENT_LIMIT: u32 = 50;
const NO_UPDATE_HOURS: f64 = 999.0;
const SUBSTANTIAL_COMMENT_CHARS: usize = 20;

const UPDATE_KEYWORDS: &[&str] = &[
    "progress",
    "completed",
    "working on",
    "finished",
    "done",
    "update",
    "status",
    "started",
    "implementing",
    "fixed",
    "issue",
    "blocker",
    "challenge",
    "estimate",
    "timeline",
    "percentage",
    "%",
];

/// Listas varridas pelo scan
///
/// Com `scan_all`, todas. Senão as listas "em andamento"; se não houver
/// nenhuma, todas menos as de concluídos/arquivo.
pub fn select_target_lists(
    lists: &[BoardList],
    scan_all: bool,
    settings: &TrackerSettings,
) -> Vec<BoardList> {
    let open = lists.iter().filter(|l| !l.closed);
    if scan_all {
        return open.cloned().collect();
    }

    let active: Vec<BoardList> = open
        .clone()
        .filter(|l| l.name_contains_any(&settings.active_list_keywords))
        .cloned()
        .collect();
    if !active.is_empty() {
        return active;
    }

    tracing::warn!("⚠️ Nenhuma lista 'em andamento' encontrada, varrendo as demais");
    open.filter(|l| !l.name_contains_any(&settings.excluded_list_keywords))
        .cloned()
        .collect()
}

/// O comentário foi escrito pelo responsável?
fn is_assignee_comment(
    comment: &CommentAction,
    assignee: &str,
    team: &TeamDirectory,
    mapping: &MemberMapping,
) -> bool {
    if let Some(mapped) = mapping.get(comment.author_id()) {
        return normalize(&mapped.team_name) == normalize(assignee);
    }

    let author = comment.author_name();
    match team.get(assignee) {
        Some(member) => member.all_names().any(|n| names_match(n, author)),
        None => names_match(assignee, author),
    }
}

fn is_meaningful_update(text: &str) -> bool {
    let lower = text.to_lowercase();
    UPDATE_KEYWORDS.iter().any(|k| lower.contains(k))
        || lower.trim().chars().count() > SUBSTANTIAL_COMMENT_CHARS
}

/// Situação de um card dado o responsável e os comentários
#[allow(clippy::too_many_arguments)]
pub fn evaluate_card(
    card: &Card,
    list_name: &str,
    assignment: &Assignment,
    comments: &[CommentAction],
    team: &TeamDirectory,
    mapping: &MemberMapping,
    update_window_hours: i64,
    now: DateTime<Utc>,
) -> CardUpdateStatus {
    let latest = comments
        .iter()
        .filter(|c| !team.is_admin_name(c.author_name()))
        .filter(|c| is_assignee_comment(c, &assignment.name, team, mapping))
        .max_by_key(|c| c.date);

    let (hours_since_update, needs_update) = match latest {
        Some(comment) => {
            let hours = comment.hours_ago(now);
            let fresh = hours < update_window_hours as f64;
            (hours, !(fresh && is_meaningful_update(comment.text())))
        }
        None => (NO_UPDATE_HOURS, true),
    };

    CardUpdateStatus {
        card_id: card.id.clone(),
        card_name: card.name.clone(),
        card_url: card.url.clone(),
        list_name: list_name.to_string(),
        assigned_user: assignment.name.clone(),
        whatsapp: assignment.whatsapp.clone(),
        assignment_confidence: assignment.confidence,
        assignment_method: assignment.method.clone(),
        hours_since_activity: (card.hours_since_activity(now) * 10.0).round() / 10.0,
        hours_since_assigned_update: (hours_since_update * 10.0).round() / 10.0,
        last_assignee_comment: latest.map(|c| c.date),
        needs_update,
        priority: Priority::from_hours(hours_since_update),
        reminder_count: 0,
        escalated: false,
    }
}

#[derive(Clone)]
pub struct UpdateScanner {
    board: BoardService,
    team: Arc<RwLock<TeamDirectory>>,
    tracker: ReminderTracker,
    settings: TrackerSettings,
}

impl UpdateScanner {
    pub fn new(
        board: BoardService,
        team: Arc<RwLock<TeamDirectory>>,
        tracker: ReminderTracker,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            board,
            team,
            tracker,
            settings,
        }
    }

    /// Comentários e checklists de um card (falhas viram listas vazias)
    async fn fetch_card_details(&self, card: Card) -> (Card, Vec<CommentAction>, Vec<Checklist>) {
        let client = self.board.client();
        let (comments, checklists) = tokio::join!(
            client.get_card_comments(&card.id, COMMENT_LIMIT),
            client.get_card_checklists(&card.id)
        );

        let comments = comments.unwrap_or_else(|e| {
            tracing::warn!("⚠️ Falha ao buscar comentários do card {}: {}", card.id, e);
            Vec::new()
        });
        let checklists = checklists.unwrap_or_else(|e| {
            tracing::warn!("⚠️ Falha ao buscar checklists do card {}: {}", card.id, e);
            Vec::new()
        });
        (card, comments, checklists)
    }

    pub async fn scan(&self, options: ScanOptions) -> AppResult<ScanReport> {
        let started = Instant::now();
        let now = Utc::now();

        let board = self.board.board().await?;
        let lists = self.board.lists().await?;
        let targets = select_target_lists(&lists, options.scan_all, &self.settings);
        let list_names: HashMap<&str, &str> = targets
            .iter()
            .map(|l| (l.id.as_str(), l.name.as_str()))
            .collect();

        tracing::info!(
            "🔍 Scan do board '{}': {} listas ({})",
            board.name,
            targets.len(),
            targets.iter().map(|l| l.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        let cards: Vec<Card> = self
            .board
            .open_cards()
            .await?
            .into_iter()
            .filter(|c| list_names.contains_key(c.id_list.as_str()) && !c.is_meta_card())
            .collect();
        let total_cards = cards.len();

        let team = self.team.read().await.clone();
        let members = self.board.members().await?;
        let mapping = map_board_members(&members, &team.names(), team.admin_names());
        tracing::debug!("👥 {} membros do board mapeados", mapping.len());

        let details: Vec<(Card, Vec<CommentAction>, Vec<Checklist>)> = stream::iter(cards)
            .map(|card| self.fetch_card_details(card))
            .buffer_unordered(self.settings.comment_fetch_concurrency.max(1))
            .collect()
            .await;

        let detector = AssignmentDetector::new(&team, &mapping);
        let mut statuses = Vec::new();
        let mut seen = HashSet::new();

        for (card, comments, checklists) in &details {
            if !seen.insert(card.id.as_str()) {
                continue;
            }
            let ctx = AssignmentContext::new(card)
                .with_checklists(checklists)
                .with_comments(comments);
            let Some(assignment) = detector.detect(&ctx) else {
                tracing::debug!("Card '{}' sem responsável, ignorado", card.name);
                continue;
            };

            let list_name = list_names.get(card.id_list.as_str()).copied().unwrap_or("Unknown");
            let mut status = evaluate_card(
                card,
                list_name,
                &assignment,
                comments,
                &team,
                &mapping,
                self.settings.update_window_hours,
                now,
            );

            if let Some(comment_date) = status.last_assignee_comment {
                self.tracker
                    .note_assignee_comment(&status.card_id, &status.assigned_user, comment_date)
                    .await?;
            }
            let record = self.tracker.get_status(&status.card_id, &status.assigned_user).await;
            status.reminder_count = record.reminder_count;
            status.escalated = record.escalated;

            statuses.push(status);
        }

        statuses.sort_by(|a, b| {
            b.hours_since_assigned_update
                .partial_cmp(&a.hours_since_assigned_update)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let needing = statuses.iter().filter(|s| s.needs_update).count();
        let processing_ms = started.elapsed().as_millis() as u64;
        log_scan_summary(&board.name, total_cards, needing, processing_ms);

        Ok(ScanReport {
            board_name: board.name,
            lists_scanned: targets.into_iter().map(|l| l.name).collect(),
            cards: statuses,
            cards_needing_updates: needing,
            total_cards,
            processing_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeamMember;
    use crate::models::AssignmentSource;
    use chrono::{Duration, TimeZone};
    use httpmock::prelude::*;
    use serde_json::json;
    use trello::{MappedMember, TrelloClient};

    fn list(id: &str, name: &str) -> BoardList {
        serde_json::from_value(json!({"id": id, "name": name, "closed": false})).unwrap()
    }

    fn team() -> TeamDirectory {
        TeamDirectory::new(
            vec![
                TeamMember::new("Levy", Some("237600000002".into())),
                TeamMember::new("Wendy", Some("237600000001".into())),
            ],
            vec!["Criselle".into()],
        )
    }

    fn comment(author_id: &str, author: &str, text: &str, date: DateTime<Utc>) -> CommentAction {
        serde_json::from_value(json!({
            "id": format!("a-{}", date.timestamp()),
            "date": date.to_rfc3339(),
            "memberCreator": {"id": author_id, "fullName": author, "username": ""},
            "data": {"text": text}
        }))
        .unwrap()
    }

    fn assignment(name: &str) -> Assignment {
        Assignment {
            name: name.into(),
            whatsapp: Some("237600000002".into()),
            source: AssignmentSource::LastCommenter,
            confidence: 95,
            method: "last commenter".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_select_target_lists() {
        let settings = TrackerSettings::default();
        let lists = vec![list("l1", "To Do"), list("l2", "Doing"), list("l3", "Done")];

        let active = select_target_lists(&lists, false, &settings);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Doing");

        assert_eq!(select_target_lists(&lists, true, &settings).len(), 3);

        let no_doing = vec![list("l1", "To Do"), list("l3", "Done"), list("l4", "Archive")];
        let fallback = select_target_lists(&no_doing, false, &settings);
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].name, "To Do");
    }

    #[test]
    fn test_evaluate_card_recent_update() {
        let team = team();
        let mapping = MemberMapping::default();
        let card = Card::new("c1", "Court Docs");
        let comments = vec![comment("x", "Levy Nkeng", "status: 80% done", now() - Duration::hours(3))];

        let status = evaluate_card(&card, "Doing", &assignment("Levy"), &comments, &team, &mapping, 24, now());
        assert!(!status.needs_update);
        assert_eq!(status.hours_since_assigned_update, 3.0);
        assert_eq!(status.priority, Priority::Normal);
        assert_eq!(status.hours_since_activity, 999.0);
    }

    #[test]
    fn test_evaluate_card_stale_or_missing() {
        let team = team();
        let mapping = MemberMapping::default();
        let card = Card::new("c1", "Court Docs");

        let stale = vec![
            comment("a", "Criselle M.", "any news?", now() - Duration::hours(1)),
            comment("x", "Levy Nkeng", "working on it", now() - Duration::hours(50)),
        ];
        let status = evaluate_card(&card, "Doing", &assignment("Levy"), &stale, &team, &mapping, 24, now());
        assert!(status.needs_update);
        assert_eq!(status.priority, Priority::Medium);
        assert_eq!(status.days_without_update(), 2);

        let status = evaluate_card(&card, "Doing", &assignment("Levy"), &[], &team, &mapping, 24, now());
        assert!(status.needs_update);
        assert_eq!(status.hours_since_assigned_update, 999.0);
        assert_eq!(status.priority, Priority::High);
        assert!(status.last_assignee_comment.is_none());
    }

    #[test]
    fn test_evaluate_card_short_fresh_comment_needs_update() {
        let team = team();
        let mapping = MemberMapping::default();
        let card = Card::new("c1", "Court Docs");
        let comments = vec![comment("x", "Levy", "ok", now() - Duration::hours(1))];

        let status = evaluate_card(&card, "Doing", &assignment("Levy"), &comments, &team, &mapping, 24, now());
        assert!(status.needs_update);
    }

    #[test]
    fn test_assignee_comment_by_member_id() {
        let team = team();
        let mut mapping = MemberMapping::default();
        mapping.insert(MappedMember {
            member_id: "m1".into(),
            team_name: "Levy".into(),
            trello_name: "L. Nkeng".into(),
            username: "lnk".into(),
        });
        let by_id = comment("m1", "Someone Else", "x", now());
        let by_name = comment("m7", "Levy N.", "x", now());
        let other = comment("m2", "Wendy Tamba", "x", now());
        assert!(is_assignee_comment(&by_id, "Levy", &team, &mapping));
        assert!(is_assignee_comment(&by_name, "Levy", &team, &mapping));
        assert!(!is_assignee_comment(&other, "Levy", &team, &mapping));
    }

    #[tokio::test]
    async fn test_scan_against_mock_trello() {
        let server = MockServer::start_async().await;
        let recent = (Utc::now() - Duration::hours(2)).to_rfc3339();
        let old = (Utc::now() - Duration::hours(80)).to_rfc3339();

        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1");
                then.status(200).json_body(json!({"id": "b1", "name": "EEInteractive", "closed": false, "url": ""}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1/lists");
                then.status(200).json_body(json!([
                    {"id": "l1", "name": "Doing", "closed": false},
                    {"id": "l2", "name": "Done", "closed": false}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1/cards");
                then.status(200).json_body(json!([
                    {"id": "c1", "name": "Court Docs", "desc": "", "idList": "l1", "idMembers": ["m1"], "url": "https://trello.com/c/c1", "closed": false},
                    {"id": "c2", "name": "Logo", "desc": "", "idList": "l1", "idMembers": ["m2"], "url": "https://trello.com/c/c2", "closed": false},
                    {"id": "c3", "name": "Old Thing", "desc": "", "idList": "l2", "idMembers": ["m1"], "url": "", "closed": false}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1/members");
                then.status(200).json_body(json!([
                    {"id": "m1", "fullName": "Levy Nkeng", "username": "levy"},
                    {"id": "m2", "fullName": "Wendy Tamba", "username": "wendy"}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cards/c1/actions");
                then.status(200).json_body(json!([{
                    "id": "a1", "date": old,
                    "memberCreator": {"id": "m1", "fullName": "Levy Nkeng", "username": "levy"},
                    "data": {"text": "uploaded half of the files"}
                }]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cards/c2/actions");
                then.status(200).json_body(json!([{
                    "id": "a2", "date": recent,
                    "memberCreator": {"id": "m2", "fullName": "Wendy Tamba", "username": "wendy"},
                    "data": {"text": "first draft is in progress"}
                }]));
            })
            .await;
        for card_id in ["c1", "c2"] {
            server
                .mock_async(|when, then| {
                    when.method(GET).path(format!("/cards/{}/checklists", card_id));
                    then.status(200).json_body(json!([]));
                })
                .await;
        }

        let client = TrelloClient::new("key", "token").unwrap().with_base_url(server.base_url());
        let board = BoardService::new(client, "eeinteractive", Some("b1".into()));
        let settings = TrackerSettings::default();
        let tracker = ReminderTracker::in_memory(&settings);
        let scanner = UpdateScanner::new(board, Arc::new(RwLock::new(team())), tracker, settings);

        let report = scanner.scan(ScanOptions::default()).await.unwrap();
        assert_eq!(report.board_name, "EEInteractive");
        assert_eq!(report.lists_scanned, vec!["Doing"]);
        assert_eq!(report.total_cards, 2);
        assert_eq!(report.cards.len(), 2);
        assert_eq!(report.cards_needing_updates, 1);

        let first = &report.cards[0];
        assert_eq!(first.card_id, "c1");
        assert_eq!(first.assigned_user, "Levy");
        assert!(first.needs_update);
        assert_eq!(first.priority, Priority::High);
        assert!(!report.cards[1].needs_update);
    }

    #[tokio::test]
    async fn test_scan_resets_tracker_when_assignee_replied() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1");
                then.status(200).json_body(json!({"id": "b1", "name": "EEInteractive", "closed": false, "url": ""}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1/lists");
                then.status(200).json_body(json!([{"id": "l1", "name": "Doing", "closed": false}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1/cards");
                then.status(200).json_body(json!([
                    {"id": "c1", "name": "Court Docs", "desc": "", "idList": "l1", "idMembers": ["m1"], "url": "https://trello.com/c/c1", "closed": false}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/boards/b1/members");
                then.status(200).json_body(json!([{"id": "m1", "fullName": "Levy Nkeng", "username": "levy"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cards/c1/checklists");
                then.status(200).json_body(json!([]));
            })
            .await;

        let settings = TrackerSettings::default();
        let tracker = ReminderTracker::in_memory(&settings);
        for _ in 0..3 {
            tracker.increment("c1", "Levy", Some("Court Docs"), None).await.unwrap();
        }
        assert!(tracker.get_status("c1", "Levy").await.escalated);

        // Resposta posterior ao último lembrete
        let replied = (Utc::now() + Duration::minutes(1)).to_rfc3339();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cards/c1/actions");
                then.status(200).json_body(json!([{
                    "id": "a1", "date": replied,
                    "memberCreator": {"id": "m1", "fullName": "Levy Nkeng", "username": "levy"},
                    "data": {"text": "status: all files uploaded"}
                }]));
            })
            .await;

        let client = TrelloClient::new("key", "token").unwrap().with_base_url(server.base_url());
        let board = BoardService::new(client, "eeinteractive", Some("b1".into()));
        let scanner = UpdateScanner::new(board, Arc::new(RwLock::new(team())), tracker.clone(), settings);

        let report = scanner.scan(ScanOptions::default()).await.unwrap();
        assert_eq!(report.cards.len(), 1);
        assert_eq!(report.cards[0].reminder_count, 0);
        assert!(!report.cards[0].escalated);
        assert!(!report.cards[0].needs_update);

        let record = tracker.get_status("c1", "Levy").await;
        assert_eq!(record.reminder_count, 0);
        assert!(!record.escalated);
    }
}
