//! The rewrite engine: turns a BBCode document into a [ParseResult].
use std::panic::{self, AssertUnwindSafe};

use bitflags::bitflags;
use log::{debug, error};
use static_assertions::assert_impl_all;

use self::session::{Session, PLACEHOLDER};
use crate::error::ParseError;
use crate::html::{escape, wrap_root, ROOT_CLOSE, ROOT_OPEN};
use crate::registry::TagRegistry;

mod scan;
mod session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub feature_flags: ParserFeature,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            feature_flags: ParserFeature::DEFAULT,
        }
    }
}

bitflags! {
    /// Optional steps run after the tag passes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ParserFeature: u32 {
        /// Wrap bare `http(s)://` URLs in links.
        const AUTO_LINK = 1 << 0;
        /// Convert newlines to `<br />`.
        const LINE_BREAKS = 1 << 1;

        /// The features enabled by [ParserConfig::default].
        const DEFAULT = Self::AUTO_LINK.bits() | Self::LINE_BREAKS.bits();

        /// All current and future feature flags.
        const ALL = u32::MAX;
    }
}

/// The outcome of a parse. Always carries renderable HTML, even when `valid` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// The document, wrapped in a single `<div class="bbcode">` container.
    pub html: String,
    /// One human readable message per rejected tag.
    pub errors: Vec<String>,
    /// Whether `errors` is empty.
    pub valid: bool,
}

impl ParseResult {
    pub fn new(html: String, errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            html,
            errors,
        }
    }

    /// The result of parsing blank input: an empty container and no errors.
    pub fn empty() -> Self {
        Self::new(format!("{ROOT_OPEN}{ROOT_CLOSE}"), vec![])
    }

    /// A result showing `input` as escaped text, with a single error.
    fn degraded(input: &str, error: ParseError) -> Self {
        Self::new(wrap_root(&escape(input)), vec![error.to_string()])
    }
}

/// Converts BBCode to HTML using the tags of a [TagRegistry].
/// # Remarks
/// A parser holds no per-call state. One instance can serve any number of threads.
#[doc(alias = "parse")]
#[derive(Debug, Clone, Copy)]
pub struct BBParser<'r> {
    registry: &'r TagRegistry,
    config: ParserConfig,
}

assert_impl_all!(BBParser<'static>: Send, Sync);

impl BBParser<'static> {
    /// A parser using the built-in tags and the default configuration.
    pub fn new() -> Self {
        Self::with_registry(TagRegistry::standard())
    }
}

impl Default for BBParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> BBParser<'r> {
    pub fn with_registry(registry: &'r TagRegistry) -> Self {
        Self {
            registry,
            config: Default::default(),
        }
    }

    pub fn with_config(self, config: ParserConfig) -> Self {
        Self { config, ..self }
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    pub fn registry(&self) -> &'r TagRegistry {
        self.registry
    }

    /// Convert `input` to HTML.
    /// # Remarks
    /// Never panics. Rejected tags stay in the output as literal text and are listed in
    /// [ParseResult::errors]. If rendering fails unexpectedly, the result is the escaped input
    /// with a single generic error.
    pub fn parse(&self, input: &str) -> ParseResult {
        if input.trim().is_empty() {
            return ParseResult::empty();
        }

        let normalized = input.replace("\r\n", "\n").replace(PLACEHOLDER, "");

        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut session = Session::new(self.registry, self.config.feature_flags);
            let html = session.render(&normalized);
            (html, session.into_errors())
        }));

        match rendered {
            Ok((html, errors)) => ParseResult::new(wrap_root(&html), errors),
            Err(e) => {
                if let Some(msg) = e.downcast_ref::<String>() {
                    error!("Panic while rendering BBCode: {msg}");
                } else if let Some(msg) = e.downcast_ref::<&str>() {
                    error!("Panic while rendering BBCode: {msg}");
                } else {
                    error!("Unknown panic while rendering BBCode");
                }

                ParseResult::degraded(input, ParseError::Internal)
            }
        }
    }

    /// Convert raw bytes to HTML. Input that is not UTF-8 is not parsed; it is shown as escaped
    /// text with a single error.
    pub fn parse_bytes(&self, input: &[u8]) -> ParseResult {
        match std::str::from_utf8(input) {
            Ok(text) => self.parse(text),
            Err(e) => {
                debug!("Rejecting non UTF-8 input: {e}");
                ParseResult::degraded(&String::from_utf8_lossy(input), ParseError::InvalidInput)
            }
        }
    }
}

#[cfg(test)]
mod tests;
