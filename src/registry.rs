//! The tag table driving the rewrite passes.
use std::collections::HashMap;
use std::sync::LazyLock;

use bitflags::bitflags;
use static_assertions::assert_impl_all;

use crate::error::RegistryError;
use crate::html::builtins;

/// Checks a tag's parameter and raw content before it is rendered.
pub type Validator = fn(parameter: Option<&str>, content: &str) -> bool;

/// Turns a tag's processed content and parameter into a self-contained HTML fragment.
pub type Renderer = fn(content: &str, parameter: Option<&str>) -> String;

/// Block tags, in the order they are applied.
/// # Remarks
/// This order is part of the output contract. Some renderers depend on earlier tags having been
/// replaced already, so new tags go at the end rather than being sorted in.
pub const BLOCK_ORDER: [&str; 8] = [
    "imagemap",
    "box",
    "spoilerbox",
    "code",
    "list",
    "notice",
    "quote",
    "heading",
];

/// Inline tags, in the order they are applied. See [BLOCK_ORDER] for why this is fixed.
pub const INLINE_ORDER: [&str; 16] = [
    "audio", "b", "centre", "c", "color", "email", "img", "i", "size", "spoiler", "s", "strike",
    "u", "url", "youtube", "profile",
];

bitflags! {
    /// Matching and rendering behaviour of a single tag.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TagFlags: u32 {
        /// The tag may carry a parameter, i.e. `[tag=value]` or `[tag="value"]`.
        const HAS_PARAMETER = 1 << 0;
        /// The bare `[tag]` form is not accepted. Only meaningful with [TagFlags::HAS_PARAMETER].
        const PARAMETER_REQUIRED = 1 << 1;
        /// The body is parsed recursively. Without this, it is escaped verbatim.
        const NESTED_CONTENT = 1 << 2;
        /// Processed in the block pass when not named in either fixed order.
        const BLOCK = 1 << 3;
        /// The body reaches the renderer neither parsed nor escaped. The renderer must escape it.
        const RAW_CONTENT = 1 << 4;
        /// Like [TagFlags::NESTED_CONTENT], but only for the `[tag=value]` form.
        const NESTED_WITH_PARAMETER = 1 << 5;
        /// Renders as a link. Bare URLs in a parsed body are not linked again.
        const LINK = 1 << 6;
    }
}

/// A single registry entry.
#[derive(Debug, Clone)]
pub struct TagDefinition {
    name: String,
    open_delimiter: String,
    close_delimiter: String,
    flags: TagFlags,
    validator: Option<Validator>,
    renderer: Renderer,
}

impl TagDefinition {
    /// Create a definition. The name is matched case-insensitively and stored lower-case.
    pub fn new(name: &str, flags: TagFlags, renderer: Renderer) -> Self {
        let name = name.to_ascii_lowercase();
        let open_delimiter = if flags.contains(TagFlags::HAS_PARAMETER) {
            format!("[{name}=")
        } else {
            format!("[{name}]")
        };

        Self {
            close_delimiter: format!("[/{name}]"),
            open_delimiter,
            name,
            flags,
            validator: None,
            renderer,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `[name]` for simple tags, `[name=` for tags taking a parameter.
    pub fn open_delimiter(&self) -> &str {
        &self.open_delimiter
    }

    pub fn close_delimiter(&self) -> &str {
        &self.close_delimiter
    }

    /// The `[name` prefix shared by every opening form of this tag.
    pub(crate) fn open_prefix(&self) -> &str {
        &self.open_delimiter[..self.open_delimiter.len() - 1]
    }

    pub fn flags(&self) -> TagFlags {
        self.flags
    }

    pub fn has_parameter(&self) -> bool {
        self.flags.contains(TagFlags::HAS_PARAMETER)
    }

    pub fn parameter_required(&self) -> bool {
        self.flags.contains(TagFlags::PARAMETER_REQUIRED)
    }

    pub fn allow_nested_content(&self) -> bool {
        self.flags.contains(TagFlags::NESTED_CONTENT)
    }

    /// Whether the body is parsed recursively, given whether this occurrence carries a parameter.
    pub fn nests_content(&self, with_parameter: bool) -> bool {
        self.allow_nested_content()
            || (with_parameter && self.flags.contains(TagFlags::NESTED_WITH_PARAMETER))
    }

    pub fn is_block_level(&self) -> bool {
        self.flags.contains(TagFlags::BLOCK)
    }

    /// Run the validator, if any. Tags without one accept everything.
    pub fn validate(&self, parameter: Option<&str>, content: &str) -> bool {
        self.validator.map_or(true, |v| v(parameter, content))
    }

    pub fn render(&self, content: &str, parameter: Option<&str>) -> String {
        (self.renderer)(content, parameter)
    }
}

/// Ordered, name-indexed collection of [TagDefinition]s.
/// # Remarks
/// A registry is only mutated while it is being built. [crate::BBParser] borrows it immutably, so a
/// single registry can back any number of concurrent parses.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: Vec<TagDefinition>,
    tag_cache: HashMap<String, usize>,
    block: Vec<usize>,
    inline: Vec<usize>,
}

assert_impl_all!(TagRegistry: Send, Sync);

static STANDARD: LazyLock<TagRegistry> = LazyLock::new(|| {
    let mut registry = TagRegistry::new();
    for tag in builtins::standard_tags() {
        if let Err(e) = registry.register(tag) {
            log::error!("Failed to register built-in tag: {e}");
        }
    }
    registry
});

impl TagRegistry {
    /// Construct a registry with no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry holding every built-in tag.
    pub fn standard() -> &'static TagRegistry {
        &STANDARD
    }

    /// Register the provided tag.
    pub fn register(&mut self, tag: TagDefinition) -> Result<(), RegistryError> {
        if tag.parameter_required() && !tag.has_parameter() {
            return Err(RegistryError::InvalidDefinition(tag.name));
        }

        if self.tag_cache.contains_key(&tag.name) {
            return Err(RegistryError::DuplicateTag(tag.name));
        }

        self.tag_cache.insert(tag.name.clone(), self.tags.len());
        self.tags.push(tag);
        self.reorder();
        Ok(())
    }

    /// Look up a tag by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&TagDefinition> {
        let idx = match self.tag_cache.get(name) {
            Some(idx) => *idx,
            None => *self.tag_cache.get(&name.to_ascii_lowercase())?,
        };

        Some(&self.tags[idx])
    }

    /// Names processed by the block pass, in processing order.
    pub fn block_tag_names(&self) -> Vec<&str> {
        self.block.iter().map(|&i| self.tags[i].name()).collect()
    }

    /// Names processed by the inline pass, in processing order.
    pub fn inline_tag_names(&self) -> Vec<&str> {
        self.inline.iter().map(|&i| self.tags[i].name()).collect()
    }

    pub(crate) fn block_tags(&self) -> impl Iterator<Item = &TagDefinition> {
        self.block.iter().map(|&i| &self.tags[i])
    }

    pub(crate) fn inline_tags(&self) -> impl Iterator<Item = &TagDefinition> {
        self.inline.iter().map(|&i| &self.tags[i])
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Rebuild both pass orders: the fixed names first, then any other tags in registration order.
    fn reorder(&mut self) {
        let fixed = |order: &[&str]| -> Vec<usize> {
            order
                .iter()
                .filter_map(|name| self.tag_cache.get(*name).copied())
                .collect()
        };

        let mut block = fixed(&BLOCK_ORDER);
        let mut inline = fixed(&INLINE_ORDER);

        for (idx, tag) in self.tags.iter().enumerate() {
            let name = tag.name();
            if BLOCK_ORDER.contains(&name) || INLINE_ORDER.contains(&name) {
                continue;
            }

            if tag.is_block_level() {
                block.push(idx);
            } else {
                inline.push(idx);
            }
        }

        self.block = block;
        self.inline = inline;
    }
}
