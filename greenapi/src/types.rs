//! Payloads da Green API

use serde::{Deserialize, Serialize};

/// Corpo de `sendMessage`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub message: &'a str,
}

/// Resposta de `sendMessage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub id_message: String,
}

/// Resposta de `getStateInstance`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateInstance {
    pub state_instance: String,
}

impl StateInstance {
    /// Instância autenticada no WhatsApp e pronta para enviar
    pub fn is_authorized(&self) -> bool {
        self.state_instance == "authorized"
    }
}
