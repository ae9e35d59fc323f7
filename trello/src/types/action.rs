//! Ações do card (comentários)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Autor de uma ação
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCreator {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default)]
    pub text: String,
}

/// Ação `commentCard` retornada por `/cards/{id}/actions?filter=commentCard`
///
/// O Trello devolve as ações da mais recente para a mais antiga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAction {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub member_creator: MemberCreator,
    #[serde(default)]
    pub data: ActionData,
}

impl CommentAction {
    pub fn text(&self) -> &str {
        &self.data.text
    }

    pub fn author_name(&self) -> &str {
        &self.member_creator.full_name
    }

    pub fn author_id(&self) -> &str {
        &self.member_creator.id
    }

    /// Horas entre o comentário e `now`
    pub fn hours_ago(&self, now: DateTime<Utc>) -> f64 {
        (now - self.date).num_seconds() as f64 / 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_deserialization() {
        let action: CommentAction = serde_json::from_value(json!({
            "id": "a1",
            "type": "commentCard",
            "date": "2025-03-10T09:15:00.000Z",
            "memberCreator": {"id": "m1", "fullName": "Wendy Tamba", "username": "wendyt"},
            "data": {"text": "Working on the login screen", "card": {"id": "c1"}}
        }))
        .unwrap();

        assert_eq!(action.author_name(), "Wendy Tamba");
        assert_eq!(action.author_id(), "m1");
        assert_eq!(action.text(), "Working on the login screen");
    }
}
