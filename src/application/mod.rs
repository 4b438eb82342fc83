//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Error taxonomy shared by every layer
//! - Messaging: Command recognition and parsing
//! - Services: Session, channel directory and command catalog

pub mod errors;
pub mod messaging;
pub mod services;
