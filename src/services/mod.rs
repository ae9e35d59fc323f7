pub mod assignment;
pub mod card_matcher;
pub mod comment_builder;
pub mod feedback;
pub mod google_docs;
pub mod meeting;
pub mod meeting_parser;
pub mod reminder_tracker;
pub mod reminders;
pub mod scheduler;
pub mod transcript;
pub mod update_scanner;

pub use card_matcher::CardMatcher;
pub use google_docs::GoogleDocsClient;
pub use meeting::MeetingProcessor;
pub use reminder_tracker::ReminderTracker;
pub use reminders::ReminderDispatcher;
pub use scheduler::AutoScanScheduler;
pub use update_scanner::UpdateScanner;
