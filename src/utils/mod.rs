pub mod error;
pub mod logging;
pub mod string_utils;

pub use error::*;
pub use string_utils::{title_case, truncate_chars, truncate_with_suffix, word_count};
