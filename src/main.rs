/// Main Application: middleware de reuniões
///
/// Arquitetura:
/// - Transcrição (Google Docs ou texto) é analisada e casada com cards do Trello
/// - Cards identificados recebem comentário e o grupo recebe um resumo via WhatsApp
/// - Scan diário encontra cards em andamento sem atualização do responsável
/// - Lembretes individuais escalam para o grupo após 3 tentativas sem resposta

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use meeting_trello_middleware::{config, middleware as app_middleware, utils, AppState};

mod handlers;

use config::Settings;
use handlers::*;
use utils::logging::*;

/// Rotas públicas (health) e rotas `/api` protegidas por `X-Admin-Key`
fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Reuniões
        .route("/process-transcript", post(process_transcript))
        .route("/demo-analyze", post(demo_analyze))
        .route("/send-participant-feedback", post(send_participant_feedback))
        // Scan e lembretes
        .route("/scan-cards", post(scan_cards))
        .route("/preview-updates", post(preview_updates))
        .route("/send-reminders", post(send_reminders))
        .route("/send-updates", post(send_updates))
        .route("/reminders", get(list_reminders))
        .route("/reminders/mark-responded", post(mark_responded))
        .route("/reminders/resolve", post(resolve_reminder))
        .route("/reminders/cards/:card_id", delete(delete_card_reminders))
        .route("/reminders/:card_id/:user", get(get_reminder))
        .route("/message-stats", get(message_stats))
        .route("/message-stats/assignee/:name", get(assignee_stats))
        .route("/card-message-status", post(card_message_status))
        // Time
        .route("/team-members", get(list_team_members).post(upsert_team_member))
        .route("/team-members/:name", delete(delete_team_member))
        .route("/board-members", get(board_members))
        .route_layer(middleware::from_fn_with_state(
            state.admin_auth.clone(),
            app_middleware::require_admin_key,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/status", get(status_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,meeting_trello_middleware=debug,tower_http=info")),
        )
        .init();

    if dotenv_loaded {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    let settings = Settings::new()
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;
    log_config_loaded(&std::env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()));

    let port = settings.server.port;
    let host = settings.server.host.clone();
    let auto_scan = settings.tracker.auto_scan_enabled;

    let app_state = Arc::new(AppState::new(settings).await?);
    log_info(&format!(
        "📋 Board '{}' configurado",
        app_state.settings.trello.board_name
    ));

    if auto_scan {
        app_state.scheduler.start().await;
    } else {
        log_info("ℹ️ Scan automático desabilitado (tracker.auto_scan_enabled = false)");
    }

    let app = build_router(app_state.clone());

    let listener = TcpListener::bind(format!("{}:{}", host, port)).await?;
    log_server_startup(port);
    log_server_ready(port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.scheduler.stop().await;
    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Failed to install SIGTERM handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use meeting_trello_middleware::middleware::admin_auth::ADMIN_KEY_HEADER;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_state(dir: &tempfile::TempDir) -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.trello.api_key = "key".into();
        settings.trello.token = "token".into();
        settings.trello.base_url = "http://127.0.0.1:9".into();
        settings.server.admin_api_key = Some("secret".into());
        settings.tracker.state_file = dir.path().join("state.json").display().to_string();
        settings.team.members_file = dir.path().join("team.yaml").display().to_string();
        Arc::new(AppState::new(settings).await.unwrap())
    }

    fn request(method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header(ADMIN_KEY_HEADER, key);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_api_requires_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let denied = app
            .clone()
            .oneshot(request("GET", "/api/reminders", Some("wrong"), None))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = app
            .oneshot(request("GET", "/api/reminders", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(json_body(allowed).await["count"], 0);
    }

    #[tokio::test]
    async fn test_reminder_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;
        state.tracker.increment("c1", "Levy", Some("Court Docs"), None).await.unwrap();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/reminders/c1/Levy", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["reminder"]["reminder_count"], 1);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/reminders/resolve",
                Some("secret"),
                Some(json!({"card_id": "c1", "user": "Levy"})),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["reminder"]["status"], "resolved");

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/reminders/cards/c1", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["removed"], 1);

        let missing = app
            .oneshot(request("DELETE", "/api/reminders/cards/c1", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_message_stats_rejects_bad_date() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/message-stats?date=11-03-2024", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request("GET", "/api/message-stats?date=2024-03-11", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_participant_feedback_needs_whatsapp() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .oneshot(request(
                "POST",
                "/api/send-participant-feedback",
                Some("secret"),
                Some(json!({"text": "Levy Nkeng: court documents are uploaded"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"], "WhatsApp (Green API) not configured");
    }

    #[tokio::test]
    async fn test_team_member_crud() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir).await);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/team-members",
                Some("secret"),
                Some(json!({"name": "Levy", "whatsapp": "237600000002"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["created"], true);
        assert!(dir.path().join("team.yaml").exists());

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/team-members/levy", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("DELETE", "/api/team-members/levy", Some("secret"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
