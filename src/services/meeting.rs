//! Processamento de uma reunião: transcrição → análise → cards → comentários → resumo
//!
//! Falhas por card (comentário, busca de comentários) não interrompem o fluxo;
//! ficam registradas na resposta.

use crate::config::settings::MeetingSettings;
use crate::config::TeamDirectory;
use crate::models::{
    CardAssignment, CardDiscussion, CardMatch, CommentError, DocContent, FeedbackReport,
    MeetingAnalysis, ProcessTranscriptRequest, ProcessTranscriptResponse,
};
use crate::services::assignment::{AssignmentContext, AssignmentDetector};
use crate::services::card_matcher::CardMatcher;
use crate::services::comment_builder::{group_summary, MeetingComment};
use crate::services::feedback::send_participant_feedback;
use crate::services::google_docs::{extract_doc_id, GoogleDocsClient};
use crate::services::meeting_parser::extract_card_discussions;
use crate::services::transcript::analyze_meeting;
use crate::utils::logging::{log_trello_api_error, log_whatsapp_error, log_whatsapp_sent};
use crate::utils::{AppError, AppResult};
use chrono::Local;
use futures_util::stream::{self, StreamExt};
use greenapi::GreenApiClient;
use ia_service::{IaService, MeetingSummary};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use trello::{map_board_members, BoardService, Card, Checklist, CommentAction, MemberMapping};

const COMMENT_LIMIT: u32 = 50;
const MAX_ASSIGNMENTS: usize = 10;
const DETAIL_CONCURRENCY: usize = 5;

/// Texto da reunião e de onde ele veio
struct MeetingSource {
    text: String,
    doc: Option<DocContent>,
    source_type: &'static str,
    source_url: Option<String>,
}

#[derive(Clone)]
pub struct MeetingProcessor {
    board: BoardService,
    docs: GoogleDocsClient,
    ai: Option<IaService>,
    whatsapp: Option<GreenApiClient>,
    group_chat_id: Option<String>,
    team: Arc<RwLock<TeamDirectory>>,
    settings: MeetingSettings,
    matcher: CardMatcher,
}

impl MeetingProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        board: BoardService,
        docs: GoogleDocsClient,
        ai: Option<IaService>,
        whatsapp: Option<GreenApiClient>,
        group_chat_id: Option<String>,
        team: Arc<RwLock<TeamDirectory>>,
        settings: MeetingSettings,
    ) -> Self {
        Self {
            board,
            docs,
            ai,
            whatsapp,
            group_chat_id,
            team,
            settings,
            matcher: CardMatcher::new(),
        }
    }

    async fn load_source(&self, request: &ProcessTranscriptRequest) -> AppResult<MeetingSource> {
        let url = request.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
        let direct = request
            .direct_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        if let Some(url) = url {
            if extract_doc_id(url).is_none() {
                return Err(AppError::ValidationError(format!(
                    "Invalid Google Docs URL: {}",
                    url
                )));
            }
            let doc = self.docs.fetch_document(url).await?;
            let text = doc.best_transcript().trim().to_string();
            if text.is_empty() {
                return Err(AppError::ValidationError(
                    "The Google Doc has no readable content".to_string(),
                ));
            }
            return Ok(MeetingSource {
                text,
                doc: Some(doc),
                source_type: "google_docs",
                source_url: Some(url.to_string()),
            });
        }

        if let Some(text) = direct {
            return Ok(MeetingSource {
                text: text.to_string(),
                doc: None,
                source_type: "direct_text",
                source_url: None,
            });
        }

        if request.direct_text.is_some() {
            return Err(AppError::ValidationError("Transcript text is empty".to_string()));
        }
        Err(AppError::ValidationError("Use url or direct_text".to_string()))
    }

    /// Análise sem Trello nem IA (usada pelo endpoint de demonstração)
    pub async fn analyze_only(&self, text: &str) -> AppResult<MeetingAnalysis> {
        if text.trim().is_empty() {
            return Err(AppError::ValidationError("Transcript text is empty".to_string()));
        }
        let team = self.team.read().await;
        Ok(analyze_meeting(text, None, team.admin_names()))
    }

    /// Analisa a transcrição e envia o feedback a cada participante do roster
    pub async fn send_feedback(&self, text: &str) -> AppResult<FeedbackReport> {
        let whatsapp = self
            .whatsapp
            .as_ref()
            .ok_or_else(|| AppError::WhatsApp("WhatsApp (Green API) not configured".to_string()))?;

        let analysis = self.analyze_only(text).await?;
        if analysis.feedback.is_empty() {
            return Err(AppError::ValidationError(
                "No participant feedback available".to_string(),
            ));
        }

        let team = self.team.read().await.clone();
        Ok(send_participant_feedback(whatsapp, &team, &analysis.feedback).await)
    }

    async fn card_details(&self, card: Card) -> (Card, Vec<CommentAction>, Vec<Checklist>) {
        let client = self.board.client();
        let (comments, checklists) = tokio::join!(
            client.get_card_comments(&card.id, COMMENT_LIMIT),
            client.get_card_checklists(&card.id)
        );
        let comments = comments.unwrap_or_else(|e| {
            log_trello_api_error("get_card_comments", Some(&card.id), &e.to_string());
            Vec::new()
        });
        let checklists = checklists.unwrap_or_else(|e| {
            log_trello_api_error("get_card_checklists", Some(&card.id), &e.to_string());
            Vec::new()
        });
        (card, comments, checklists)
    }

    async fn member_mapping(&self, team: &TeamDirectory) -> MemberMapping {
        match self.board.members().await {
            Ok(members) => map_board_members(&members, &team.names(), team.admin_names()),
            Err(e) => {
                tracing::warn!("⚠️ Membros do board indisponíveis: {}", e);
                MemberMapping::default()
            }
        }
    }

    async fn summarize(&self, text: &str) -> (Option<MeetingSummary>, Option<String>) {
        let Some(ai) = &self.ai else {
            return (None, None);
        };
        match ai.summarize_meeting(text).await {
            Ok(summary) => (Some(summary), None),
            Err(e) => {
                tracing::warn!("⚠️ Resumo por IA falhou, seguindo sem ele: {}", e);
                (None, Some(e.to_string()))
            }
        }
    }

    pub async fn process(
        &self,
        request: ProcessTranscriptRequest,
    ) -> AppResult<ProcessTranscriptResponse> {
        let started = Instant::now();
        let source = self.load_source(&request).await?;
        let post_comments = request.post_comments.unwrap_or(self.settings.post_comments);
        let send_summary = request.send_summary.unwrap_or(self.settings.send_group_summary);

        tracing::info!(
            "🎙️ Processando reunião ({}, {} chars)",
            source.source_type,
            source.text.len()
        );

        let team = self.team.read().await.clone();
        let analysis = analyze_meeting(&source.text, source.doc.as_ref(), team.admin_names());
        let (summary, summary_error) = self.summarize(&source.text).await;

        let cards = self.board.open_cards().await?;
        let matched_cards: Vec<CardMatch> = self
            .matcher
            .find_matches(&source.text, source.doc.as_ref(), &cards, self.ai.as_ref())
            .await;

        let cards_by_id: HashMap<&str, &Card> = cards.iter().map(|c| (c.id.as_str(), c)).collect();
        let top_cards: Vec<Card> = matched_cards
            .iter()
            .take(MAX_ASSIGNMENTS.max(self.settings.max_comments))
            .filter_map(|m| cards_by_id.get(m.card_id.as_str()).map(|c| (*c).clone()))
            .collect();

        let details: Vec<(Card, Vec<CommentAction>, Vec<Checklist>)> = stream::iter(top_cards)
            .map(|card| self.card_details(card))
            .buffered(DETAIL_CONCURRENCY)
            .collect()
            .await;

        let mapping = self.member_mapping(&team).await;
        let detector = AssignmentDetector::new(&team, &mapping);

        let discussions: HashMap<String, CardDiscussion> =
            extract_card_discussions(&source.text, &cards, &self.settings.facilitator_names)
                .into_iter()
                .map(|d| (d.card_id.clone(), d))
                .collect();

        let doc_key_points: Vec<String> = match &source.doc {
            Some(doc) if !doc.key_points.is_empty() => doc.key_points.clone(),
            _ => analysis.key_points.clone(),
        };

        let today = Local::now().date_naive();
        let mut card_assignments = Vec::new();
        let mut comments_posted = 0;
        let mut comment_errors = Vec::new();

        for (index, (card, comments, checklists)) in details.iter().enumerate() {
            let ctx = AssignmentContext::new(card)
                .with_checklists(checklists)
                .with_comments(comments)
                .with_transcript(&source.text);
            let candidates = detector.detect_all(&ctx);
            let assignee = candidates.first().cloned().or_else(|| detector.detect(&ctx));

            if post_comments && index < self.settings.max_comments {
                let primary: Vec<_> = if candidates.is_empty() {
                    assignee.iter().cloned().collect()
                } else {
                    candidates.clone()
                };
                let text = MeetingComment {
                    card_name: &card.name,
                    date: today,
                    candidates: &primary,
                    discussion: discussions.get(&card.id),
                    doc_key_points: &doc_key_points,
                }
                .render();

                match self.board.client().add_comment(&card.id, &text).await {
                    Ok(_) => {
                        comments_posted += 1;
                        tracing::info!("💬 Comentário postado no card '{}'", card.name);
                    }
                    Err(e) => {
                        log_trello_api_error("add_comment", Some(&card.id), &e.to_string());
                        comment_errors.push(CommentError {
                            card_id: card.id.clone(),
                            card_name: card.name.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            if index < MAX_ASSIGNMENTS {
                card_assignments.push(CardAssignment {
                    card_id: card.id.clone(),
                    card_name: card.name.clone(),
                    assignee,
                    candidates,
                });
            }
        }

        let notes = source.doc.as_ref().map(|d| d.notes.as_str());
        let group_text = group_summary(
            today,
            notes,
            summary.as_ref(),
            self.settings.group_summary_notes_chars,
        );
        let summary_sent = send_summary && self.send_group_summary(&group_text).await;

        let cards_found = matched_cards.len();
        let processing_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "✅ Reunião processada: {} cards, {} comentários, resumo enviado: {} ({}ms)",
            cards_found,
            comments_posted,
            summary_sent,
            processing_ms
        );

        Ok(ProcessTranscriptResponse {
            success: true,
            message: format!(
                "Meeting processed: {} cards matched, {} comments posted",
                cards_found, comments_posted
            ),
            source_type: source.source_type.to_string(),
            source_url: source.source_url,
            word_count: analysis.word_count,
            analysis,
            summary,
            summary_error,
            matched_cards,
            cards_found,
            comments_posted,
            comment_errors,
            card_assignments,
            group_summary: group_text,
            summary_sent,
            processing_ms,
        })
    }

    async fn send_group_summary(&self, text: &str) -> bool {
        let (Some(whatsapp), Some(group)) = (&self.whatsapp, self.group_chat_id.as_deref()) else {
            tracing::debug!("Resumo do grupo não enviado: WhatsApp ou grupo não configurado");
            return false;
        };
        match whatsapp.send_with_retry(group, text).await {
            Ok(_) => {
                log_whatsapp_sent(group, "meeting summary", 0);
                true
            }
            Err(e) => {
                log_whatsapp_error(group, &e.to_string());
                false
            }
        }
    }
}
