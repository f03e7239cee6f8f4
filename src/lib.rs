//! BBCode to HTML conversion for user profile text, built for both live previews and as a fallback
//! validator.
//!
//! ```rust
//! let result = bbprofile::parse("[b]Hello[/b] [color=nope]world[/color]");
//! assert!(result.html.contains("<strong>Hello</strong>"));
//! assert!(result.html.contains("[color=nope]world[/color]"));
//! assert!(!result.valid);
//! ```
//!
//! Tags are applied in two fixed passes, block tags and then inline tags (see
//! [registry::BLOCK_ORDER] and [registry::INLINE_ORDER]). After the passes, bare URLs are linked
//! and newlines become line breaks. A tag that fails validation is left in the output as text and
//! reported in [ParseResult::errors].

mod error;
pub mod html;
mod parser;
pub mod registry;

pub use error::{ParseError, RegistryError};
pub use parser::{BBParser, ParseResult, ParserConfig, ParserFeature};
pub use registry::{Renderer, TagDefinition, TagFlags, TagRegistry, Validator};

/// Convert `input` with the built-in tags and default configuration.
pub fn parse(input: &str) -> ParseResult {
    BBParser::new().parse(input)
}

/// Convert raw bytes with the built-in tags and default configuration.
/// See [BBParser::parse_bytes].
pub fn parse_bytes(input: &[u8]) -> ParseResult {
    BBParser::new().parse_bytes(input)
}
