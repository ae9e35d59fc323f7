//! Boards: listagem, resolução do board de trabalho e cache
//!
//! O middleware trabalha com um único board. Ele é identificado por ID explícito
//! (`TRELLO_BOARD_ID`) ou, na falta dele, pelo primeiro board aberto cujo nome
//! contém um fragmento configurado (ex: "eeinteractive").

use crate::client::TrelloClient;
use crate::error::{Result, TrelloError};
use crate::types::{Board, BoardList, Card, Member};
use std::sync::Arc;
use tokio::sync::RwLock;

impl TrelloClient {
    /// Lista os boards do usuário autenticado
    pub async fn list_boards(&self) -> Result<Vec<Board>> {
        self.get_json("/members/me/boards", &[("fields", "id,name,closed,url".to_string())])
            .await
    }

    /// Busca um board pelo ID
    pub async fn get_board(&self, board_id: &str) -> Result<Board> {
        self.get_json(
            &format!("/boards/{}", urlencoding::encode(board_id)),
            &[("fields", "id,name,closed,url".to_string())],
        )
        .await
    }

    /// Lista as colunas (listas) abertas de um board
    pub async fn get_lists(&self, board_id: &str) -> Result<Vec<BoardList>> {
        self.get_json(
            &format!("/boards/{}/lists", urlencoding::encode(board_id)),
            &[("filter", "open".to_string())],
        )
        .await
    }

    /// Lista os cards abertos de um board
    pub async fn get_open_cards(&self, board_id: &str) -> Result<Vec<Card>> {
        self.get_json(
            &format!("/boards/{}/cards", urlencoding::encode(board_id)),
            &[
                ("filter", "open".to_string()),
                (
                    "fields",
                    "id,name,desc,idList,idMembers,url,closed,dateLastActivity".to_string(),
                ),
            ],
        )
        .await
    }

    /// Lista os membros de um board
    pub async fn get_board_members(&self, board_id: &str) -> Result<Vec<Member>> {
        self.get_json(
            &format!("/boards/{}/members", urlencoding::encode(board_id)),
            &[("fields", "id,fullName,username".to_string())],
        )
        .await
    }
}

/// Escolhe o board de trabalho a partir da lista de boards do usuário
pub fn select_board<'a>(boards: &'a [Board], name_fragment: &str) -> Option<&'a Board> {
    let fragment = name_fragment.trim().to_lowercase();
    if fragment.is_empty() {
        return None;
    }
    boards
        .iter()
        .filter(|b| !b.closed)
        .find(|b| b.name.to_lowercase().contains(&fragment))
}

/// Resolve e mantém em cache o board de trabalho
#[derive(Clone)]
pub struct BoardService {
    client: TrelloClient,
    board_name: String,
    board_id: Option<String>,
    cached: Arc<RwLock<Option<Board>>>,
}

impl BoardService {
    pub fn new(client: TrelloClient, board_name: impl Into<String>, board_id: Option<String>) -> Self {
        Self {
            client,
            board_name: board_name.into(),
            board_id: board_id.filter(|id| !id.trim().is_empty()),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    pub fn client(&self) -> &TrelloClient {
        &self.client
    }

    /// Retorna o board de trabalho (do cache quando disponível)
    pub async fn board(&self) -> Result<Board> {
        if let Some(board) = self.cached.read().await.as_ref() {
            return Ok(board.clone());
        }

        let board = match &self.board_id {
            Some(id) => {
                tracing::debug!("🔎 Resolvendo board pelo ID {}", id);
                self.client.get_board(id).await?
            }
            None => {
                let boards = self.client.list_boards().await?;
                select_board(&boards, &self.board_name)
                    .cloned()
                    .ok_or_else(|| {
                        TrelloError::NotFound(format!(
                            "Nenhum board aberto contendo '{}' ({} boards verificados)",
                            self.board_name,
                            boards.len()
                        ))
                    })?
            }
        };

        tracing::info!("📋 Board de trabalho: {} ({})", board.name, board.id);
        *self.cached.write().await = Some(board.clone());
        Ok(board)
    }

    /// Limpa o cache (próxima chamada resolve o board novamente)
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub async fn lists(&self) -> Result<Vec<BoardList>> {
        let board = self.board().await?;
        self.client.get_lists(&board.id).await
    }

    /// Cards abertos do board de trabalho
    pub async fn open_cards(&self) -> Result<Vec<Card>> {
        let board = self.board().await?;
        let cards = self.client.get_open_cards(&board.id).await?;
        Ok(cards.into_iter().filter(|c| !c.closed).collect())
    }

    pub async fn members(&self) -> Result<Vec<Member>> {
        let board = self.board().await?;
        self.client.get_board_members(&board.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn board(id: &str, name: &str, closed: bool) -> Board {
        Board {
            id: id.into(),
            name: name.into(),
            closed,
            url: String::new(),
        }
    }

    #[test]
    fn test_select_board_skips_closed() {
        let boards = vec![
            board("b0", "EEInteractive (old)", true),
            board("b1", "Marketing", false),
            board("b2", "EEInteractive Team", false),
        ];

        let selected = select_board(&boards, "eeinteractive").unwrap();
        assert_eq!(selected.id, "b2");
        assert!(select_board(&boards, "finance").is_none());
        assert!(select_board(&boards, "  ").is_none());
    }

    #[tokio::test]
    async fn test_board_service_resolves_by_name_and_caches() {
        let server = MockServer::start_async().await;
        let boards_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/1/members/me/boards");
                then.status(200).json_body(json!([
                    {"id": "b1", "name": "Personal", "closed": false},
                    {"id": "b2", "name": "EEInteractive", "closed": false}
                ]));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let service = BoardService::new(client, "eeinteractive", None);

        assert_eq!(service.board().await.unwrap().id, "b2");
        assert_eq!(service.board().await.unwrap().id, "b2");
        boards_mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_board_service_prefers_explicit_id() {
        let server = MockServer::start_async().await;
        let board_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/1/boards/b9");
                then.status(200).json_body(json!({"id": "b9", "name": "Ops", "closed": false}));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let service = BoardService::new(client, "eeinteractive", Some("b9".into()));

        assert_eq!(service.board().await.unwrap().name, "Ops");
        board_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_board_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/1/members/me/boards");
                then.status(200).json_body(json!([{"id": "b1", "name": "Personal"}]));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let service = BoardService::new(client, "eeinteractive", None);

        assert!(matches!(service.board().await, Err(TrelloError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_cards_filters_closed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/1/boards/b1");
                then.status(200).json_body(json!({"id": "b1", "name": "EEInteractive"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/1/boards/b1/cards")
                    .query_param("filter", "open");
                then.status(200).json_body(json!([
                    {"id": "c1", "name": "Mobile app", "closed": false},
                    {"id": "c2", "name": "Old card", "closed": true}
                ]));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let service = BoardService::new(client, "", Some("b1".into()));

        let cards = service.open_cards().await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "c1");
    }
}
