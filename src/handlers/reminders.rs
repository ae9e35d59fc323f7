use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use meeting_trello_middleware::models::{CardUpdateStatus, ScanOptions};
use meeting_trello_middleware::utils::logging::*;
use meeting_trello_middleware::utils::{AppError, AppResult};
use meeting_trello_middleware::AppState;

const DEFAULT_COOLDOWN_HOURS: i64 = 24;

#[derive(Debug, Default, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub cards: Option<Vec<CardUpdateStatus>>,
    #[serde(default)]
    pub scan_all: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendUpdateRequest {
    pub message: String,
    #[serde(default)]
    pub chat_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardUserRequest {
    pub card_id: String,
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct CardMessageStatusRequest {
    pub card_id: String,
    pub user: String,
    #[serde(default)]
    pub cooldown_hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub date: Option<String>,
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

pub async fn scan_cards(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ScanOptions>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/scan-cards", "POST");
    let options = body.map(|Json(o)| o).unwrap_or_default();

    let report = state.scanner.scan(options).await?;
    Ok(Json(json!({
        "success": true,
        "report": report,
        "timestamp": Utc::now().to_rfc3339()
    })))
}

/// Pré-visualiza os lembretes; sem cards no corpo, faz o scan antes
pub async fn preview_updates(
    State(state): State<Arc<AppState>>,
    body: Option<Json<PreviewRequest>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/preview-updates", "POST");
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let cards = match request.cards {
        Some(cards) => cards,
        None => {
            state
                .scanner
                .scan(ScanOptions {
                    scan_all: request.scan_all,
                })
                .await?
                .cards
        }
    };

    let preview = state.dispatcher.preview(&cards).await?;
    Ok(Json(json!({
        "success": true,
        "cards_needing_updates": cards.iter().filter(|c| c.needs_update).count(),
        "preview": preview,
        "timestamp": Utc::now().to_rfc3339()
    })))
}

/// Execução manual do ciclo automático: scan + envio
pub async fn send_reminders(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ScanOptions>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/send-reminders", "POST");
    let options = body.map(|Json(o)| o).unwrap_or_default();

    let report = state.scanner.scan(options).await?;
    let dispatch = state.dispatcher.dispatch(&report.cards).await?;

    Ok(Json(json!({
        "success": dispatch.errors.is_empty(),
        "cards_scanned": report.total_cards,
        "cards_needing_updates": report.cards_needing_updates,
        "dispatch": dispatch,
        "timestamp": Utc::now().to_rfc3339()
    })))
}

/// Mensagem livre para o grupo (ou para um chat específico)
pub async fn send_updates(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/send-updates", "POST");
    require("message", &request.message)?;

    let whatsapp = state
        .whatsapp
        .as_ref()
        .ok_or_else(|| AppError::WhatsApp("WhatsApp (Green API) not configured".to_string()))?;
    let chat_id = request
        .chat_id
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .or_else(|| state.settings.group_chat_id())
        .ok_or_else(|| AppError::ValidationError("chat_id is required (no group chat configured)".to_string()))?
        .to_string();

    let sent = whatsapp.send_with_retry(&chat_id, &request.message).await?;
    log_whatsapp_sent(&chat_id, "manual update", 0);

    Ok(Json(json!({
        "success": true,
        "chat_id": chat_id,
        "message_id": sent.id_message,
        "timestamp": Utc::now().to_rfc3339()
    })))
}

pub async fn list_reminders(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/api/reminders", "GET");
    let records = state.tracker.records().await;
    let escalated = records.iter().filter(|r| r.escalated).count();

    Json(json!({
        "success": true,
        "count": records.len(),
        "escalated": escalated,
        "reminders": records
    }))
}

pub async fn get_reminder(
    State(state): State<Arc<AppState>>,
    Path((card_id, user)): Path<(String, String)>,
) -> Json<Value> {
    log_request_received("/api/reminders/:card_id/:user", "GET");
    let record = state.tracker.get_status(&card_id, &user).await;
    Json(json!({ "success": true, "reminder": record }))
}

pub async fn mark_responded(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CardUserRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/reminders/mark-responded", "POST");
    require("card_id", &request.card_id)?;
    require("user", &request.user)?;

    let marked = state
        .tracker
        .mark_response_received(&request.card_id, &request.user)
        .await?;
    Ok(Json(json!({
        "success": true,
        "messages_marked": marked,
        "reminder": state.tracker.get_status(&request.card_id, &request.user).await
    })))
}

pub async fn resolve_reminder(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CardUserRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/reminders/resolve", "POST");
    require("card_id", &request.card_id)?;
    require("user", &request.user)?;

    let record = state.tracker.resolve(&request.card_id, &request.user).await?;
    Ok(Json(json!({ "success": true, "reminder": record })))
}

pub async fn delete_card_reminders(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/reminders/cards/:card_id", "DELETE");
    let removed = state.tracker.remove_card(&card_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!("No reminders for card {}", card_id)));
    }
    Ok(Json(json!({ "success": true, "removed": removed })))
}

pub async fn message_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/message-stats", "GET");
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
        })?,
        None => Utc::now().date_naive(),
    };

    let stats = state.tracker.daily_stats(date).await;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

pub async fn assignee_stats(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<Value> {
    log_request_received("/api/message-stats/assignee/:name", "GET");
    let stats = state.tracker.assignee_stats(&name).await;
    Json(json!({ "success": true, "stats": stats }))
}

pub async fn card_message_status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CardMessageStatusRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/card-message-status", "POST");
    require("card_id", &request.card_id)?;
    require("user", &request.user)?;

    let permission = state
        .tracker
        .can_send_message(
            &request.card_id,
            &request.user,
            request.cooldown_hours.unwrap_or(DEFAULT_COOLDOWN_HOURS),
            Utc::now(),
        )
        .await;
    let record = state.tracker.get_status(&request.card_id, &request.user).await;

    Ok(Json(json!({
        "success": true,
        "permission": permission,
        "reminder": record
    })))
}
