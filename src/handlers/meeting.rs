use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use meeting_trello_middleware::models::ProcessTranscriptRequest;
use meeting_trello_middleware::utils::logging::*;
use meeting_trello_middleware::utils::AppError;
use meeting_trello_middleware::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscriptTextRequest {
    #[serde(alias = "direct_text", alias = "transcript")]
    pub text: String,
}

/// Fluxo completo: análise, matching de cards, comentários e resumo do grupo
pub async fn process_transcript(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessTranscriptRequest>,
) -> Result<Json<Value>, AppError> {
    let started = Instant::now();
    log_request_received("/api/process-transcript", "POST");

    let response = state.meetings.process(request).await?;

    log_request_processed("/api/process-transcript", 200, started.elapsed().as_millis() as u64);
    Ok(Json(serde_json::to_value(response)?))
}

/// Só a análise da transcrição, sem Trello e sem IA
pub async fn demo_analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranscriptTextRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/demo-analyze", "POST");

    let analysis = state.meetings.analyze_only(&request.text).await?;

    Ok(Json(json!({
        "success": true,
        "demo": true,
        "analysis": analysis,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Feedback de participação para cada falante encontrado no roster
pub async fn send_participant_feedback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranscriptTextRequest>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/send-participant-feedback", "POST");

    let report = state.meetings.send_feedback(&request.text).await?;

    Ok(Json(json!({
        "success": true,
        "messages_sent": report.messages_sent,
        "messages_failed": report.messages_failed,
        "sent_details": report.sent,
        "failed_details": report.failed
    })))
}
