//! Log line format subsystem.
//!
//! # Data Flow
//! ```text
//! format option (preset name or template)
//!     → preset.rs (resolve named presets)
//!     → compiler.rs (split into literal / token segments, once)
//!     → token.rs (resolve token names to extractors)
//!
//! Per request, after completion:
//!     CompiledFormat::render(request, response) → one line
//! ```
//!
//! # Design Decisions
//! - Every format error surfaces at construction, never per request
//! - Tokens with no value render as `-`

pub mod compiler;
pub mod preset;
pub mod token;

pub use compiler::{CompiledFormat, Segment};
pub use preset::{FormatSpec, Preset};
pub use token::{DateFormat, Token};

use thiserror::Error;

/// Errors raised while compiling a format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown token `:{0}`")]
    UnknownToken(String),

    #[error("token `:{0}` requires a [header] argument")]
    MissingArgument(String),

    #[error("invalid header name `{0}`")]
    InvalidHeader(String),
}
