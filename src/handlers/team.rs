use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use meeting_trello_middleware::config::TeamMember;
use meeting_trello_middleware::utils::logging::*;
use meeting_trello_middleware::utils::AppError;
use meeting_trello_middleware::AppState;
use trello::map_board_members;

pub async fn list_team_members(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/api/team-members", "GET");
    let team = state.team.read().await;

    Json(json!({
        "success": true,
        "count": team.members().len(),
        "members": team.members(),
        "admin_names": team.admin_names()
    }))
}

/// Cria ou atualiza um membro e persiste o roster
pub async fn upsert_team_member(
    State(state): State<Arc<AppState>>,
    Json(member): Json<TeamMember>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/team-members", "POST");
    if member.name.trim().is_empty() {
        return Err(AppError::ValidationError("name is required".to_string()));
    }

    let created = state.team.write().await.upsert(member.clone());
    state.save_team().await?;
    log_info(&format!(
        "👥 Membro {} {}",
        member.name,
        if created { "adicionado" } else { "atualizado" }
    ));

    Ok(Json(json!({
        "success": true,
        "created": created,
        "member": member
    })))
}

pub async fn delete_team_member(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/api/team-members/:name", "DELETE");

    let removed = state
        .team
        .write()
        .await
        .remove(&name)
        .ok_or_else(|| AppError::NotFound(format!("Team member '{}' not found", name)))?;
    state.save_team().await?;

    Ok(Json(json!({ "success": true, "removed": removed })))
}

/// Membros do board e como foram associados ao roster
pub async fn board_members(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    log_request_received("/api/board-members", "GET");

    let members = state.board.members().await?;
    let team = state.team.read().await;
    let mapping = map_board_members(&members, &team.names(), team.admin_names());

    let unmapped: Vec<_> = members
        .iter()
        .filter(|m| mapping.get(&m.id).is_none())
        .collect();
    let mut mapped: Vec<_> = mapping.iter().collect();
    mapped.sort_by(|a, b| a.team_name.cmp(&b.team_name));

    Ok(Json(json!({
        "success": true,
        "board_members": members.len(),
        "mapped": mapped,
        "unmapped": unmapped
    })))
}
