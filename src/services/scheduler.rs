use crate::models::{DispatchReport, ScanOptions, ScanReport};
use crate::services::reminders::ReminderDispatcher;
use crate::services::update_scanner::UpdateScanner;
use crate::utils::logging::*;
use crate::utils::AppResult;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;

const RETRY_AFTER_ERROR: Duration = Duration::from_secs(3600);

/// Tempo até a próxima ocorrência de `hour:00` (horário local)
///
/// Se o horário de hoje já passou (ou é exatamente agora), agenda para amanhã.
pub fn duration_until_next_run(now: NaiveDateTime, hour: u32) -> Duration {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let mut next = now.date().and_time(time);
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Scan diário automático seguido do envio de lembretes
#[derive(Clone)]
pub struct AutoScanScheduler {
    scanner: UpdateScanner,
    dispatcher: ReminderDispatcher,
    scan_hour: u32,
    /// Estado de execução
    running: Arc<RwLock<bool>>,
    /// Loop em execução; abortado no `stop`
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AutoScanScheduler {
    pub fn new(scanner: UpdateScanner, dispatcher: ReminderDispatcher, scan_hour: u32) -> Self {
        Self {
            scanner,
            dispatcher,
            scan_hour,
            running: Arc::new(RwLock::new(false)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Um ciclo completo: scan dos cards ativos e envio dos lembretes
    pub async fn run_once(&self) -> AppResult<(ScanReport, DispatchReport)> {
        let report = self.scanner.scan(ScanOptions::default()).await?;
        let dispatch = self.dispatcher.dispatch(&report.cards).await?;
        Ok((report, dispatch))
    }

    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            log_warning("Auto scan scheduler already running");
            return;
        }
        *running = true;
        drop(running);

        let scheduler = self.clone();

        let handle = tokio::spawn(async move {
            log_info(&format!("⏰ Scan automático agendado para {:02}:00", scheduler.scan_hour));

            loop {
                let wait = duration_until_next_run(Local::now().naive_local(), scheduler.scan_hour);
                tracing::debug!("Próximo scan automático em {}s", wait.as_secs());
                tokio::time::sleep(wait).await;

                if !scheduler.is_running().await {
                    break;
                }

                match scheduler.run_once().await {
                    Ok((report, dispatch)) => log_info(&format!(
                        "✅ Scan automático: {} cards precisam de atualização, {} lembretes, {} escalações",
                        report.cards_needing_updates,
                        dispatch.reminders_sent,
                        dispatch.escalations_sent
                    )),
                    Err(e) => {
                        log_error(&format!("❌ Scan automático falhou: {}. Nova tentativa em 1h", e));
                        tokio::time::sleep(RETRY_AFTER_ERROR).await;
                        if !scheduler.is_running().await {
                            break;
                        }
                        if let Err(e) = scheduler.run_once().await {
                            log_error(&format!("❌ Nova tentativa do scan automático falhou: {}", e));
                        }
                    }
                }
            }

            log_info("Auto scan scheduler stopped");
        });

        *self.task.lock().await = Some(handle);
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        log_info("Auto scan scheduler stopped");
    }
}
