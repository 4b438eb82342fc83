//! Platform adapters implementing [`MessagingService`](crate::domain::traits::MessagingService)

pub mod console;
pub mod slack;

pub use console::ConsoleAdapter;
pub use slack::SlackAdapter;
