// Biblioteca do middleware de reuniões Trello/WhatsApp
// Expõe módulos para uso em testes e binários

pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use config::{Settings, TeamDirectory};
use greenapi::GreenApiClient;
use ia_service::{IaService, IaServiceConfig};
use middleware::AdminAuth;
use services::{
    AutoScanScheduler, GoogleDocsClient, MeetingProcessor, ReminderDispatcher, ReminderTracker,
    UpdateScanner,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use trello::{BoardService, TrelloClient};
use utils::AppResult;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub board: BoardService,
    pub whatsapp: Option<GreenApiClient>,
    pub ai: Option<IaService>,
    pub team: Arc<RwLock<TeamDirectory>>,
    pub tracker: ReminderTracker,
    pub scanner: UpdateScanner,
    pub dispatcher: ReminderDispatcher,
    pub meetings: MeetingProcessor,
    pub scheduler: AutoScanScheduler,
    pub admin_auth: AdminAuth,
}

impl AppState {
    /// Monta clientes e serviços a partir da configuração
    ///
    /// Trello é obrigatório; WhatsApp e IA ficam desabilitados quando não configurados.
    pub async fn new(settings: Settings) -> AppResult<Self> {
        let trello_client = TrelloClient::new(&settings.trello.api_key, &settings.trello.token)?
            .with_base_url(&settings.trello.base_url);
        let board = BoardService::new(
            trello_client,
            &settings.trello.board_name,
            settings.trello.board_id.clone().filter(|id| !id.trim().is_empty()),
        );

        let whatsapp = if settings.green_api.is_configured() {
            Some(
                GreenApiClient::new(&settings.green_api.instance_id, &settings.green_api.token)?
                    .with_base_url(&settings.green_api.base_url),
            )
        } else {
            tracing::warn!("⚠️ Green API não configurada - lembretes por WhatsApp desabilitados");
            None
        };

        let ai = match settings.ai_api_key().filter(|_| settings.ai.enabled) {
            Some(key) => {
                let config = IaServiceConfig::new(key.to_string())
                    .with_chat_model(&settings.ai.chat_model)
                    .with_temperature(settings.ai.temperature)
                    .with_max_tokens(settings.ai.max_tokens);
                Some(IaService::new(config)?)
            }
            None => {
                tracing::info!("ℹ️ IA desabilitada - usando apenas matching por regras");
                None
            }
        };

        let team = TeamDirectory::load_or_env(
            &settings.team.members_file,
            settings.tracker.admin_names.clone(),
        )?;
        tracing::info!("👥 {} membros no roster", team.members().len());
        let team = Arc::new(RwLock::new(team));

        let tracker = ReminderTracker::open(&settings.tracker).await?;
        let group_chat_id = settings.group_chat_id().map(str::to_string);

        let docs = GoogleDocsClient::new(
            &settings.google_docs.export_base_url,
            settings.google_docs.timeout_secs,
        )?;

        let scanner = UpdateScanner::new(
            board.clone(),
            team.clone(),
            tracker.clone(),
            settings.tracker.clone(),
        );
        let dispatcher = ReminderDispatcher::new(whatsapp.clone(), tracker.clone(), group_chat_id.clone());
        let meetings = MeetingProcessor::new(
            board.clone(),
            docs,
            ai.clone(),
            whatsapp.clone(),
            group_chat_id,
            team.clone(),
            settings.meeting.clone(),
        );
        let scheduler =
            AutoScanScheduler::new(scanner.clone(), dispatcher.clone(), settings.tracker.scan_hour);
        let admin_auth = AdminAuth::new(
            settings.server.admin_api_key.clone(),
            Settings::is_production(),
        );

        Ok(Self {
            settings,
            board,
            whatsapp,
            ai,
            team,
            tracker,
            scanner,
            dispatcher,
            meetings,
            scheduler,
            admin_auth,
        })
    }

    /// Persiste o roster atual no arquivo configurado
    pub async fn save_team(&self) -> AppResult<()> {
        let team = self.team.read().await;
        team.save(&self.settings.team.members_file)
    }
}
