//! Checklists de card (usadas para detectar responsáveis)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckItemState {
    Complete,
    #[default]
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: CheckItemState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub check_items: Vec<CheckItem>,
}

impl Checklist {
    /// Checklists de atribuição ("Assigned", "Team", "Responsible"...)
    pub fn is_assignment_list(&self) -> bool {
        let name = self.name.to_lowercase();
        ["assign", "team", "member", "responsible"]
            .iter()
            .any(|k| name.contains(k))
    }
}
