//! Application services - Session orchestration and the lookup tables it owns

pub mod channel_directory;
pub mod command_catalog;
pub mod session;

pub use channel_directory::ChannelDirectory;
pub use command_catalog::CommandCatalog;
pub use session::{
    ConnectionSession, ReconnectPolicy, SessionBuilder, SessionSettings, SessionState,
};
