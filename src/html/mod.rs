//! HTML output helpers and the built-in tag renderers.
//! Everything emitted by this crate is built from fixed markup plus text passed through [escape].
use std::fmt::Display;

pub mod autolink;
pub mod builtins;
pub mod imagemap;

/// Opening of the container every parse result is wrapped in.
pub const ROOT_OPEN: &str = "<div class=\"bbcode\">";
/// Closing counterpart of [ROOT_OPEN].
pub const ROOT_CLOSE: &str = "</div>";

/// Escape text for use both as element content and inside a double or single quoted attribute.
/// `&`, `<`, `>`, `"` and `'` are replaced by entities.
pub fn escape(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// [escape] the string form of any displayable value.
pub fn escape_display<T: Display + ?Sized>(value: &T) -> String {
    escape(&value.to_string())
}

/// Wrap a rendered document in the root container.
pub(crate) fn wrap_root(html: &str) -> String {
    let mut out = String::with_capacity(ROOT_OPEN.len() + html.len() + ROOT_CLOSE.len());
    out.push_str(ROOT_OPEN);
    out.push_str(html);
    out.push_str(ROOT_CLOSE);
    out
}
