//! Operações sobre cards: comentários e checklists

use crate::client::TrelloClient;
use crate::error::{Result, TrelloError};
use crate::types::{Checklist, CommentAction};

/// Limite máximo de ações aceito pelo endpoint `/cards/{id}/actions`
const MAX_ACTIONS_LIMIT: u32 = 1000;

impl TrelloClient {
    /// Comentários de um card, do mais recente para o mais antigo
    pub async fn get_card_comments(&self, card_id: &str, limit: u32) -> Result<Vec<CommentAction>> {
        let limit = limit.clamp(1, MAX_ACTIONS_LIMIT);
        self.get_json(
            &format!("/cards/{}/actions", urlencoding::encode(card_id)),
            &[
                ("filter", "commentCard".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    /// Checklists de um card
    pub async fn get_card_checklists(&self, card_id: &str) -> Result<Vec<Checklist>> {
        self.get_json(
            &format!("/cards/{}/checklists", urlencoding::encode(card_id)),
            &[("fields", "name,checkItems".to_string())],
        )
        .await
    }

    /// Publica um comentário em um card
    pub async fn add_comment(&self, card_id: &str, text: &str) -> Result<CommentAction> {
        if text.trim().is_empty() {
            return Err(TrelloError::ValidationError("Comentário vazio".to_string()));
        }

        let action: CommentAction = self
            .post_json(
                &format!("/cards/{}/actions/comments", urlencoding::encode(card_id)),
                &[("text", text.to_string())],
            )
            .await?;

        tracing::info!("💬 Comentário publicado no card {} (action {})", card_id, action.id);
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_card_comments() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/1/cards/c1/actions")
                    .query_param("filter", "commentCard")
                    .query_param("limit", "50");
                then.status(200).json_body(json!([
                    {
                        "id": "a2",
                        "date": "2025-03-11T10:00:00.000Z",
                        "memberCreator": {"id": "m1", "fullName": "Wendy Tamba"},
                        "data": {"text": "Done with the login screen"}
                    },
                    {
                        "id": "a1",
                        "date": "2025-03-10T10:00:00.000Z",
                        "memberCreator": {"id": "m9", "fullName": "Admin"},
                        "data": {"text": "Status?"}
                    }
                ]));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let comments = client.get_card_comments("c1", 50).await.unwrap();

        mock.assert_async().await;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author_name(), "Wendy Tamba");
    }

    #[tokio::test]
    async fn test_add_comment_posts_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/1/cards/c1/actions/comments")
                    .query_param("text", "Meeting update");
                then.status(200).json_body(json!({
                    "id": "a9",
                    "date": "2025-03-11T10:00:00.000Z",
                    "data": {"text": "Meeting update"}
                }));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let action = client.add_comment("c1", "Meeting update").await.unwrap();

        mock.assert_async().await;
        assert_eq!(action.id, "a9");
    }

    #[tokio::test]
    async fn test_add_comment_rejects_empty_text() {
        let client = TrelloClient::new("k", "t").unwrap();
        assert!(matches!(
            client.add_comment("c1", "   ").await,
            Err(TrelloError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_get_card_checklists() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/1/cards/c1/checklists");
                then.status(200).json_body(json!([
                    {"id": "cl1", "name": "Assigned", "checkItems": [{"id": "i1", "name": "Levy", "state": "incomplete"}]}
                ]));
            })
            .await;

        let client = TrelloClient::new("k", "t").unwrap().with_base_url(server.url("/1"));
        let checklists = client.get_card_checklists("c1").await.unwrap();
        assert_eq!(checklists[0].check_items[0].name, "Levy");
    }
}
