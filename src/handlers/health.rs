use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use meeting_trello_middleware::config::Settings;
use meeting_trello_middleware::utils::logging::*;
use meeting_trello_middleware::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "meeting-trello-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    log_integration_status_check();

    let trello_status = match state.board.client().test_connection().await {
        Ok(_) => "connected",
        Err(e) => {
            log_trello_api_error("test_connection", None, &e.to_string());
            "disconnected"
        }
    };

    let response = json!({
        "ready": trello_status == "connected",
        "service": "meeting-trello-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "trello": {
                "status": trello_status,
                "board_name": state.settings.trello.board_name
            }
        }
    });

    if trello_status == "connected" {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_integration_status_check();

    let mut trello_info = json!({
        "configured": state.settings.trello.is_configured(),
        "board_name": state.settings.trello.board_name,
    });
    match state.board.board().await {
        Ok(board) => {
            trello_info["connection"] = json!("success");
            trello_info["board_id"] = json!(board.id);
            trello_info["resolved_board"] = json!(board.name);
        }
        Err(e) => {
            trello_info["connection"] = json!("failed");
            trello_info["error"] = json!(e.to_string());
        }
    }

    let mut whatsapp_info = json!({
        "configured": state.whatsapp.is_some(),
        "group_chat_configured": state.settings.group_chat_id().is_some(),
    });
    if let Some(whatsapp) = &state.whatsapp {
        whatsapp_info["state"] = match whatsapp.get_state_instance().await {
            Ok(instance) => json!(instance.state_instance),
            Err(e) => json!(format!("error: {}", e)),
        };
    }

    let team_size = state.team.read().await.members().len();
    let tracked = state.tracker.records().await.len();

    Json(json!({
        "service": "meeting-trello-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()),
        "production": Settings::is_production(),
        "admin_key_configured": state.admin_auth.is_configured(),
        "integrations": {
            "trello": trello_info,
            "whatsapp": whatsapp_info,
            "ai": {
                "enabled": state.ai.is_some(),
                "model": state.settings.ai.chat_model
            }
        },
        "team_members": team_size,
        "tracked_reminders": tracked,
        "auto_scan": {
            "enabled": state.settings.tracker.auto_scan_enabled,
            "running": state.scheduler.is_running().await,
            "scan_hour": state.settings.tracker.scan_hour
        }
    }))
}
