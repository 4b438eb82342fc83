//! Domain traits - Abstractions for infrastructure implementations

pub mod messaging;

pub use messaging::MessagingService;
