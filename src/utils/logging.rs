use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!(
        "Request processed: {} - Status: {} - Duration: {}ms",
        endpoint, status, duration_ms
    );
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Meeting-Trello middleware server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_integration_status_check() {
    debug!("Integration status check requested");
}

pub fn log_trello_api_error(operation: &str, card_id: Option<&str>, error: &str) {
    error!(
        "❌ Trello API error: {} - Card: {:?} - Error: {}",
        operation, card_id, error
    );
}

pub fn log_whatsapp_sent(chat_id: &str, kind: &str, cards: usize) {
    info!("📱 WhatsApp {} enviado para {} ({} cards)", kind, chat_id, cards);
}

pub fn log_whatsapp_error(chat_id: &str, error: &str) {
    error!("❌ Falha no envio WhatsApp para {}: {}", chat_id, error);
}

pub fn log_reminder_incremented(card_id: &str, user: &str, count: u32, escalated: bool) {
    if escalated {
        warn!(
            "🚨 Lembrete #{} para {} no card {} - ESCALADO",
            count, user, card_id
        );
    } else {
        info!("🔔 Lembrete #{} para {} no card {}", count, user, card_id);
    }
}

pub fn log_escalation_sent(users: usize, cards: usize) {
    warn!(
        "🚨 Escalação enviada ao grupo: {} responsáveis, {} cards",
        users, cards
    );
}

pub fn log_scan_summary(board: &str, total: usize, needing_updates: usize, duration_ms: u64) {
    info!(
        "📋 Scan do board '{}': {} cards, {} precisam de atualização ({}ms)",
        board, total, needing_updates, duration_ms
    );
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
