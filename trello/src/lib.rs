//! Cliente da API Trello usado pelo middleware de reuniões
//!
//! Funcionalidades:
//!
//! - Cliente REST autenticado por `key`/`token` ([`TrelloClient`])
//! - Resolução e cache do board de trabalho ([`boards::BoardService`])
//! - Comentários e checklists de cards ([`cards`])
//! - Fuzzy matching de nomes ([`matching`])
//! - Mapeamento de membros do board para o roster do time ([`members`])
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use trello::{TrelloClient, boards::BoardService};
//!
//! #[tokio::main]
//! async fn main() -> trello::Result<()> {
//!     let api_key = std::env::var("TRELLO_API_KEY").expect("TRELLO_API_KEY não configurado");
//!     let token = std::env::var("TRELLO_TOKEN").expect("TRELLO_TOKEN não configurado");
//!
//!     let client = TrelloClient::new(api_key, token)?;
//!     let board = BoardService::new(client, "eeinteractive", None);
//!
//!     for card in board.open_cards().await? {
//!         println!("{} -> {}", card.name, card.url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod boards;
pub mod cards;
pub mod client;
pub mod error;
pub mod matching;
pub mod members;
pub mod types;

pub use boards::BoardService;
pub use client::TrelloClient;
pub use error::{Result, TrelloError};
pub use members::{map_board_members, CommenterMatch, MappedMember, MemberMapping};
pub use types::{Board, BoardList, Card, CheckItem, CheckItemState, Checklist, CommentAction, Member};
