//! HL7 v2 segment parsing and message classification.
//!
//! This crate turns raw pipe-delimited message text into an ordered,
//! index-stable structure (`ParsedMessage` / `Segment`) and derives the
//! message trigger (`MessageType`) from the MSH header. It performs **no
//! semantic validation**: missing optional fields are represented, not
//! rejected. Only structurally unparseable input fails.

pub mod parser;
pub mod trigger;

pub use parser::{Delimiters, ParsedMessage, Segment};
pub use trigger::{classify, MessageType};

/// Errors for structurally unparseable input.
///
/// Parsing never fails for missing optional fields; these variants cover
/// the two ways a message can be malformed at the structural level.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("message contains no segments")]
    Empty,
    #[error("message has no MSH header segment")]
    MissingHeader,
}
