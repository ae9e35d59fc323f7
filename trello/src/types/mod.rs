//! Tipos da API Trello
//!
//! Apenas os campos usados pelo middleware são mapeados; o restante do
//! payload do Trello é ignorado na desserialização.

pub mod action;
pub mod board;
pub mod card;
pub mod checklist;
pub mod member;

pub use action::{ActionData, CommentAction, MemberCreator};
pub use board::{Board, BoardList};
pub use card::Card;
pub use checklist::{CheckItem, CheckItemState, Checklist};
pub use member::Member;
