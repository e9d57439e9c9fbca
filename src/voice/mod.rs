//! Voice command handling
//!
//! - `commands`: transcript normalization and rule-based classification
//! - `responses`: the sentences spoken back to the user
//! - `io`: listening/speaking flags and the directives they produce

mod commands;
mod io;
pub mod responses;

pub use commands::{classify, Command, Query, Transcript};
pub use io::VoiceIo;
