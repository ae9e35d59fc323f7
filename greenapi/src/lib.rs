//! Cliente Green API para notificações WhatsApp
//!
//! Envia mensagens individuais (`{telefone}@c.us`) e para grupos (`{id}@g.us`).
//!
//! ```rust,ignore
//! use greenapi::GreenApiClient;
//!
//! let client = GreenApiClient::new("1101000000", "token")?;
//! client.send_with_retry("237650123456", "🤖 Reminder").await?;
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{normalize_chat_id, GreenApiClient};
pub use error::{GreenApiError, Result};
pub use types::{SendMessageResponse, StateInstance};
