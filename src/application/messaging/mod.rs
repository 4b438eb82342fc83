//! Message handling - Recognising commands and structuring their tokens

pub mod classifier;
pub mod parser;

pub use classifier::{Classification, CommandRequest, MessageClassifier};
pub use parser::CommandParser;
