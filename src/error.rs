//! Error types. Parse errors never escape [`BBParser::parse`][crate::BBParser::parse]; they are
//! rendered to strings and collected into [`ParseResult::errors`][crate::ParseResult::errors].
use thiserror::Error;

/// A single problem found while converting a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A tag's validator rejected its parameter.
    #[error("Invalid value \"{parameter}\" for [{tag}] tag")]
    InvalidParameter { tag: String, parameter: String },

    /// A tag's validator rejected its content.
    #[error("Invalid content for [{tag}] tag")]
    InvalidContent { tag: String },

    #[error("Input is not valid UTF-8 text")]
    InvalidInput,

    #[error("Unexpected error while converting BBCode, showing the raw text instead")]
    Internal,
}

/// Errors raised when building a [`TagRegistry`][crate::TagRegistry].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Tag [{0}] is already registered")]
    DuplicateTag(String),

    #[error("Tag [{0}] requires a parameter but does not accept one")]
    InvalidDefinition(String),
}
