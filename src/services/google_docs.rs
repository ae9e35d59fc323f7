//! Google Docs: download do texto exportado e separação por seções
//!
//! Usa a exportação pública (`/export?format=txt`), então o documento precisa
//! estar compartilhado como "qualquer pessoa com o link".

use crate::models::DocContent;
use crate::utils::{AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static DOC_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/document/d/([a-zA-Z0-9_-]+)").expect("regex de doc id válida"));

/// Conteúdo menor que isso é tratado como página de erro
const MIN_DOC_CHARS: usize = 50;

/// Linhas gerais (fora de seção) maiores que isso viram pontos-chave
const GENERAL_KEY_POINT_MIN_CHARS: usize = 20;

/// Cabeçalhos de seção são linhas curtas
const MAX_HEADER_CHARS: usize = 60;

/// Extrai o ID de uma URL do Google Docs
///
/// ```
/// use meeting_trello_middleware::services::google_docs::extract_doc_id;
///
/// let url = "https://docs.google.com/document/d/1AbC-x_9/edit?usp=sharing";
/// assert_eq!(extract_doc_id(url), Some("1AbC-x_9".to_string()));
/// assert_eq!(extract_doc_id("https://example.com"), None);
/// ```
pub fn extract_doc_id(url: &str) -> Option<String> {
    DOC_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Clone)]
pub struct GoogleDocsClient {
    http_client: reqwest::Client,
    export_base_url: String,
}

impl GoogleDocsClient {
    pub fn new(export_base_url: impl Into<String>, timeout_secs: u64) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("Mozilla/5.0 (compatible; meeting-trello-middleware)")
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            export_base_url: export_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Baixa o texto de um documento
    pub async fn fetch_text(&self, doc_id: &str) -> AppResult<String> {
        let url = format!(
            "{}/document/d/{}/export",
            self.export_base_url,
            urlencoding::encode(doc_id)
        );

        tracing::info!("📄 Baixando Google Doc {}", doc_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("format", "txt")])
            .send()
            .await
            .map_err(|e| AppError::GoogleDocs(format!("Falha ao acessar o documento: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::GoogleDocs(format!(
                "Documento retornou HTTP {}. Verifique se está compartilhado como 'anyone with the link'",
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::GoogleDocs(format!("Falha ao ler o documento: {}", e)))?;

        validate_export(&text)?;
        tracing::info!("✅ Google Doc baixado: {} chars", text.chars().count());
        Ok(text)
    }

    /// Baixa e separa o documento por seções
    pub async fn fetch_document(&self, url: &str) -> AppResult<DocContent> {
        let doc_id = extract_doc_id(url).ok_or_else(|| {
            AppError::ValidationError(format!("URL do Google Docs inválida: {}", url))
        })?;
        let text = self.fetch_text(&doc_id).await?;
        Ok(parse_document(&text))
    }
}

/// Rejeita páginas HTML (login/permissão) e respostas vazias
fn validate_export(text: &str) -> AppResult<()> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.chars().count() < MIN_DOC_CHARS || trimmed.starts_with("<!DOCTYPE") {
        return Err(AppError::GoogleDocs(
            "Could not read the document. Make sure it is shared as 'anyone with the link can view'"
                .to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Notes,
    Transcript,
    BoardReview,
    Summary,
    KeyPoints,
    Decisions,
    ActionItems,
    Objectives,
}

fn is_header_line(line: &str) -> bool {
    if line.chars().count() > MAX_HEADER_CHARS {
        return false;
    }
    // "Fala: conteúdo" é diálogo, "Notes:" é cabeçalho
    match line.find(':') {
        Some(idx) => line[idx + 1..].trim().is_empty(),
        None => true,
    }
}

fn detect_section(lower: &str) -> Option<Section> {
    let has_any = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));

    if lower.starts_with("notes") || lower.contains("notes:") {
        Some(Section::Notes)
    } else if lower.starts_with("transcript") || lower.contains("transcript:") {
        Some(Section::Transcript)
    } else if lower.contains("trello board review") && lower.contains("task assignments") {
        Some(Section::BoardReview)
    } else if has_any(&["summary"]) {
        Some(Section::Summary)
    } else if has_any(&["key points", "main points", "highlights"]) {
        Some(Section::KeyPoints)
    } else if has_any(&["decisions", "resolved", "agreed"]) {
        Some(Section::Decisions)
    } else if has_any(&["action items", "next steps", "todo"]) {
        Some(Section::ActionItems)
    } else if has_any(&["objectives", "goals", "purpose"]) {
        Some(Section::Objectives)
    } else {
        None
    }
}

fn list_item(line: &str) -> Option<String> {
    if let Some(rest) = line
        .strip_prefix('•')
        .or_else(|| line.strip_prefix('-'))
        .or_else(|| line.strip_prefix('*'))
    {
        return Some(rest.trim().to_string());
    }
    if line.chars().take(3).any(|c| c.is_ascii_digit()) {
        return Some(line.to_string());
    }
    None
}

fn append_block(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(line);
}

/// Separa o texto exportado nas seções conhecidas
pub fn parse_document(text: &str) -> DocContent {
    let mut content = DocContent::from_text(text);
    let mut section = Section::General;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();

        if is_header_line(line) {
            if let Some(next) = detect_section(&lower) {
                if next != section {
                    tracing::debug!("Seção detectada: {:?}", next);
                }
                section = next;
                continue;
            }
        }

        match section {
            Section::Notes => append_block(&mut content.notes, line),
            Section::Transcript => append_block(&mut content.transcript, line),
            Section::BoardReview => append_block(&mut content.trello_board_review, line),
            Section::Summary => append_block(&mut content.meeting_summary, line),
            Section::KeyPoints | Section::Decisions | Section::ActionItems | Section::Objectives => {
                if let Some(item) = list_item(line) {
                    let list = match section {
                        Section::KeyPoints => &mut content.key_points,
                        Section::Decisions => &mut content.decisions,
                        Section::ActionItems => &mut content.action_items,
                        _ => &mut content.objectives,
                    };
                    list.push(item);
                }
            }
            Section::General => {
                if line.chars().count() > GENERAL_KEY_POINT_MIN_CHARS {
                    content.key_points.push(line.to_string());
                }
            }
        }
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const DOC: &str = "\
Weekly Team Sync - March 11
Notes
Trello board review looked good overall.
Trello Board Review & Task Assignments
- Mobile app login screen fixes
- Organize court documents folder
Summary
The team reviewed progress on all active cards.
Key Points
• Login flow is blocked on API keys
Decisions
1. Ship the login fix Friday
Action Items
- Wendy: update the funnel copy
Transcript:
James Taylor: Let's look at the Trello board.
Wendy Tamba: The funnel copy is almost done.
";

    #[test]
    fn test_parse_document_sections() {
        let doc = parse_document(DOC);

        assert_eq!(doc.key_points[0], "Weekly Team Sync - March 11");
        assert_eq!(doc.notes, "Trello board review looked good overall.");
        assert!(doc.trello_board_review.contains("- Mobile app login screen fixes"));
        assert!(doc.trello_board_review.contains("- Organize court documents folder"));
        assert_eq!(doc.meeting_summary, "The team reviewed progress on all active cards.");
        assert!(doc.key_points.contains(&"Login flow is blocked on API keys".to_string()));
        assert_eq!(doc.decisions, vec!["1. Ship the login fix Friday"]);
        assert_eq!(doc.action_items, vec!["Wendy: update the funnel copy"]);
        assert!(doc.transcript.starts_with("James Taylor: Let's look at the Trello board."));
        assert!(doc.transcript.contains("Wendy Tamba"));
        assert!(doc.has_board_review());
    }

    #[test]
    fn test_dialogue_lines_do_not_switch_sections() {
        let doc = parse_document("Transcript\nLevy: we agreed on the summary\nWendy: ok");
        assert_eq!(doc.transcript, "Levy: we agreed on the summary\nWendy: ok");
        assert!(doc.decisions.is_empty());
    }

    #[test]
    fn test_validate_export() {
        assert!(validate_export("too short").is_err());
        assert!(validate_export(&format!("<!DOCTYPE html>{}", "x".repeat(100))).is_err());
        assert!(validate_export(&"Meeting transcript ".repeat(5)).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/document/d/doc123/export")
                    .query_param("format", "txt");
                then.status(200).body(DOC);
            })
            .await;

        let client = GoogleDocsClient::new(server.base_url(), 5).unwrap();
        let text = client.fetch_text("doc123").await.unwrap();

        mock.assert_async().await;
        assert!(text.contains("Weekly Team Sync"));
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_login_page() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/document/d/private/export");
                then.status(200)
                    .body(format!("<!DOCTYPE html><html>{}</html>", "sign in ".repeat(20)));
            })
            .await;

        let client = GoogleDocsClient::new(server.base_url(), 5).unwrap();
        assert!(matches!(
            client.fetch_text("private").await,
            Err(AppError::GoogleDocs(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_document_rejects_invalid_url() {
        let client = GoogleDocsClient::new("http://localhost:1", 1).unwrap();
        assert!(matches!(
            client.fetch_document("https://example.com/nothing").await,
            Err(AppError::ValidationError(_))
        ));
    }
}
