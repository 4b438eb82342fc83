//! Domain entities - Core business objects with no external dependencies

pub mod channel;
pub mod command;
pub mod event;

pub use channel::{BotIdentity, ChannelInfo};
pub use command::{CatalogEntry, CommandSchema, ParsedCommand, WILDCARD_PREFIX};
pub use event::Event;
