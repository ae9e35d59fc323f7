//! Boards e listas (colunas de status)

use serde::{Deserialize, Serialize};

/// Board do Trello
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub url: String,
}

/// Lista de um board (ex: "DOING", "In Progress", "Done")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub id_board: Option<String>,
}

impl BoardList {
    /// Verifica se o nome da lista contém alguma das keywords (case-insensitive)
    pub fn name_contains_any(&self, keywords: &[String]) -> bool {
        let name = self.name.to_lowercase();
        keywords.iter().any(|k| name.contains(&k.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_board_deserialization_ignores_extra_fields() {
        let board: Board = serde_json::from_value(json!({
            "id": "b1",
            "name": "EEInteractive Team",
            "closed": false,
            "url": "https://trello.com/b/abc",
            "prefs": {"background": "blue"}
        }))
        .unwrap();

        assert_eq!(board.id, "b1");
        assert!(!board.closed);
    }

    #[test]
    fn test_list_keyword_match() {
        let list = BoardList {
            id: "l1".into(),
            name: "In Progress 🚧".into(),
            closed: false,
            id_board: None,
        };

        assert!(list.name_contains_any(&["doing".into(), "in progress".into()]));
        assert!(!list.name_contains_any(&["done".into()]));
    }
}
