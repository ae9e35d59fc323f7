// Handlers HTTP do middleware de reuniões
pub mod health;
pub mod meeting;
pub mod reminders;
pub mod team;

pub use health::*;
pub use meeting::*;
pub use reminders::*;
pub use team::*;
