//! Domain layer - Core types with no I/O
//!
//! This layer contains:
//! - Entities: Events, channels, command schemas and parsed commands
//! - Traits: Abstractions for infrastructure (MessagingService)

pub mod entities;
pub mod traits;
