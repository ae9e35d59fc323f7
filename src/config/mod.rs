pub mod settings;
pub mod team;

pub use settings::Settings;
pub use team::{TeamDirectory, TeamMember};
