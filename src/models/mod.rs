pub mod matching;
pub mod meeting;
pub mod reminder;
pub mod scan;

pub use matching::*;
pub use meeting::*;
pub use reminder::*;
pub use scan::*;
