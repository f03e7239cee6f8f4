//! Locating occurrences of a single tag.
//!
//! A tag occurrence is its opening form, the shortest body up to the next closing delimiter, and
//! that delimiter, all matched ignoring ASCII case. Opening forms are tried in this order at each
//! candidate position:
//! - `[tag=value]`
//! - `[tag="value"]`
//! - `[tag]`, unless the tag requires a parameter.
use crate::registry::TagDefinition;

/// One occurrence of a tag. Offsets are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub parameter: Option<&'a str>,
    pub content: &'a str,
}

/// Find the ASCII `needle` in `haystack` at or after `from`, ignoring ASCII case.
/// # Remarks
/// Matches always start on an ASCII byte, so the returned offset is a char boundary.
pub(crate) fn find_ignore_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    let last = hay.len().checked_sub(needle.len())?;

    (from..=last).find(|&i| hay[i..(i + needle.len())].eq_ignore_ascii_case(needle))
}

/// Parse a parameter following `=`. Returns the value and the number of bytes consumed,
/// including the closing `]`.
fn parse_parameter(rest: &str) -> Option<(&str, usize)> {
    'quoted: {
        let Some(quoted) = rest.strip_prefix('"') else {
            break 'quoted;
        };
        let Some(end) = quoted.find("\"]") else {
            break 'quoted;
        };

        let value = &quoted[..end];
        if value.contains('\n') {
            break 'quoted;
        }

        return Some((value, "\"".len() + end + "\"]".len()));
    }

    let end = rest.find(']')?;
    let value = &rest[..end];
    if value.is_empty() || value.contains(['\n', '[']) {
        return None;
    }

    Some((value, end + "]".len()))
}

/// Find the first occurrence of `tag` in `text` starting at or after `from`.
pub(crate) fn next_match<'a>(
    text: &'a str,
    from: usize,
    tag: &TagDefinition,
) -> Option<TagMatch<'a>> {
    let prefix = tag.open_prefix();
    let close = tag.close_delimiter();
    let mut loc = from;

    loop {
        let start = find_ignore_case(text, prefix, loc)?;
        let after = start + prefix.len();
        loc = after;

        let rest = &text[after..];
        let (parameter, body_start) = match rest.as_bytes().first() {
            Some(b']') if !tag.parameter_required() => (None, after + "]".len()),
            Some(b'=') if tag.has_parameter() => match parse_parameter(&rest["=".len()..]) {
                Some((value, consumed)) => (Some(value), after + "=".len() + consumed),
                None => continue,
            },
            // A longer tag name sharing this prefix, or a form this tag doesn't accept.
            _ => continue,
        };

        // Without a closing delimiter after this opener, no later opener can have one either.
        let close_at = find_ignore_case(text, close, body_start)?;

        return Some(TagMatch {
            start,
            end: close_at + close.len(),
            parameter,
            content: &text[body_start..close_at],
        });
    }
}

/// Iterator over the non-overlapping occurrences of a tag, left to right.
pub(crate) struct TagMatches<'a, 't> {
    text: &'a str,
    tag: &'t TagDefinition,
    loc: usize,
}

impl<'a, 't> TagMatches<'a, 't> {
    pub fn new(text: &'a str, tag: &'t TagDefinition) -> Self {
        Self { text, tag, loc: 0 }
    }
}

impl<'a, 't> Iterator for TagMatches<'a, 't> {
    type Item = TagMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.loc >= self.text.len() {
            return None;
        }

        let found = next_match(self.text, self.loc, self.tag)?;
        self.loc = found.end;
        Some(found)
    }
}
