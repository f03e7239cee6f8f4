//! State for a single call to [`BBParser::parse`][super::BBParser::parse].
//!
//! Every successfully rendered tag is moved out of the working text into a fragment list and
//! replaced by a placeholder (`U+001A`, index, `U+001A`). Later passes and the auto-linker therefore
//! only ever see text the user wrote, never markup this crate produced. A nested body is handed to
//! its renderer with its own placeholders still in place, so renderers that split their content (like
//! `list` on `[*]`) never look inside a child. Placeholders are swapped for their HTML once, after the
//! outermost level is done.
use std::borrow::Cow;

use log::{debug, trace};

use super::scan::{TagMatch, TagMatches};
use super::ParserFeature;
use crate::error::ParseError;
use crate::html::{autolink, escape};
use crate::registry::{TagDefinition, TagFlags, TagRegistry};

/// Delimits placeholder indices in the working text. Stripped from input before parsing.
pub(crate) const PLACEHOLDER: char = '\u{1A}';

struct Fragment {
    /// The text the tag was matched from, which may itself contain placeholders.
    source: String,
    html: String,
}

pub(crate) struct Session<'r> {
    registry: &'r TagRegistry,
    features: ParserFeature,
    errors: Vec<String>,
    fragments: Vec<Fragment>,
}

impl<'r> Session<'r> {
    pub fn new(registry: &'r TagRegistry, features: ParserFeature) -> Self {
        Self {
            registry,
            features,
            errors: vec![],
            fragments: vec![],
        }
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Render `text`: block tags, then inline tags, then bare links and line breaks.
    pub fn render(&mut self, text: &str) -> String {
        let html = self.render_level(text);
        self.expand(&html, self.fragments.len()).into_owned()
    }

    /// [Session::render] without expanding the placeholders of tags rendered at this level.
    fn render_level(&mut self, text: &str) -> String {
        trace!("Rendering {} bytes", text.len());
        let registry = self.registry;

        let mut text = text.to_owned();
        for tag in registry.block_tags().chain(registry.inline_tags()) {
            let replaced = match self.apply(tag, &text) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };

            if let Some(replaced) = replaced {
                text = replaced;
            }
        }

        let linked = if self.features.contains(ParserFeature::AUTO_LINK) {
            autolink::link(&text)
        } else {
            escape(&text)
        };

        if self.features.contains(ParserFeature::LINE_BREAKS) {
            linked.replace('\n', "<br />")
        } else {
            linked
        }
    }

    /// Replace every valid occurrence of `tag` in `text` with a placeholder.
    fn apply<'t>(&mut self, tag: &TagDefinition, text: &'t str) -> Cow<'t, str> {
        let mut out = String::new();
        let mut copied = 0;

        for found in TagMatches::new(text, tag) {
            let Some(html) = self.render_match(tag, &found) else {
                continue;
            };

            out.push_str(&text[copied..found.start]);
            self.stash(&text[found.start..found.end], html, &mut out);
            copied = found.end;
        }

        if copied == 0 {
            return Cow::Borrowed(text);
        }

        out.push_str(&text[copied..]);
        Cow::Owned(out)
    }

    /// Validate and render a single occurrence. [None] leaves the source in place.
    fn render_match(&mut self, tag: &TagDefinition, found: &TagMatch<'_>) -> Option<String> {
        let raw = self.restore(found.content);
        let parameter = found.parameter.map(|p| self.restore(p));

        if !tag.validate(parameter.as_deref(), &raw) {
            let error = match parameter {
                Some(parameter) => ParseError::InvalidParameter {
                    tag: tag.name().to_owned(),
                    parameter: parameter.into_owned(),
                },
                None => ParseError::InvalidContent {
                    tag: tag.name().to_owned(),
                },
            };

            debug!("Leaving [{}] as text: {error}", tag.name());
            self.errors.push(error.to_string());
            return None;
        }

        let content = if tag.nests_content(parameter.is_some()) {
            self.render_nested(tag, found.content)
        } else if tag.flags().contains(TagFlags::RAW_CONTENT) {
            raw.into_owned()
        } else {
            escape(&raw)
        };

        Some(tag.render(&content, parameter.as_deref()))
    }

    /// Render a nested body, leaving its placeholders for the enclosing level to expand.
    fn render_nested(&mut self, tag: &TagDefinition, body: &str) -> String {
        if !tag.flags().contains(TagFlags::LINK) {
            return self.render_level(body);
        }

        // The body is already the text of a link.
        let features = self.features;
        self.features.remove(ParserFeature::AUTO_LINK);
        let html = self.render_level(body);
        self.features = features;
        html
    }

    fn stash(&mut self, source: &str, html: String, out: &mut String) {
        let idx = self.fragments.len();
        self.fragments.push(Fragment {
            source: source.to_owned(),
            html,
        });

        out.push(PLACEHOLDER);
        out.push_str(&idx.to_string());
        out.push(PLACEHOLDER);
    }

    /// Swap placeholders in `text` for the original source of their fragments, recursively.
    fn restore<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.replace_placeholders(text, self.fragments.len(), true)
    }

    /// Swap placeholders in `text` for the HTML of their fragments, recursively. Only fragments
    /// below `limit` are expanded; a fragment only ever refers to ones stashed before it.
    fn expand<'t>(&self, text: &'t str, limit: usize) -> Cow<'t, str> {
        self.replace_placeholders(text, limit, false)
    }

    fn replace_placeholders<'t>(&self, text: &'t str, limit: usize, source: bool) -> Cow<'t, str> {
        if !text.contains(PLACEHOLDER) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find(PLACEHOLDER) {
            out.push_str(&rest[..open]);
            let after = &rest[(open + PLACEHOLDER.len_utf8())..];

            let Some(close) = after.find(PLACEHOLDER) else {
                rest = after;
                break;
            };

            let fragment = after[..close]
                .parse::<usize>()
                .ok()
                .filter(|&idx| idx < limit)
                .and_then(|idx| self.fragments.get(idx).map(|f| (idx, f)));

            match fragment {
                Some((idx, fragment)) if source => {
                    out.push_str(&self.replace_placeholders(&fragment.source, idx, true))
                }
                Some((idx, fragment)) => out.push_str(&self.expand(&fragment.html, idx)),
                None => debug!("Dropping unknown placeholder {:?}", &after[..close]),
            }

            rest = &after[(close + PLACEHOLDER.len_utf8())..];
        }

        out.push_str(rest);
        Cow::Owned(out)
    }
}
