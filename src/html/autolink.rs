//! Turns bare `http://` and `https://` URLs in plain text into links.
use super::escape;

/// Whether `c` can continue a bare URL.
fn is_url_char(c: char) -> bool {
    !(c.is_whitespace() || c.is_control() || matches!(c, '[' | ']' | '<' | '>' | '"' | '\''))
}

/// Net count of `[` over `]` in `text`.
fn bracket_balance(text: &str) -> isize {
    text.bytes().fold(0, |depth, b| match b {
        b'[' => depth + 1,
        b']' => depth - 1,
        _ => depth,
    })
}

fn write_link(url: &str, out: &mut String) {
    let url = escape(url);
    out.push_str("<a rel=\"nofollow\" href=\"");
    out.push_str(&url);
    out.push_str("\">");
    out.push_str(&url);
    out.push_str("</a>");
}

/// Escape `text`, wrapping every bare URL in an anchor.
/// # Remarks
/// A URL is left as text when it sits inside an unclosed `[...` sequence, or between a `[url` and a
/// later `[/url]`, which is markup the user wrote but that did not become a tag.
pub fn link(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let first_url_open = lower.find("[url");
    let last_url_close = lower.rfind("[/url]");

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut scanned = 0;
    let mut depth = 0;
    let mut search = 0;

    while let Some(found) = lower[search..].find("http") {
        let start = search + found;
        let scheme_len = if lower[start..].starts_with("https://") {
            "https://".len()
        } else if lower[start..].starts_with("http://") {
            "http://".len()
        } else {
            search = start + "http".len();
            continue;
        };

        let body = &text[(start + scheme_len)..];
        let body_len = body.find(|c| !is_url_char(c)).unwrap_or(body.len());
        let end = start + scheme_len + body_len;
        search = end;

        if body_len == 0 {
            continue;
        }

        depth += bracket_balance(&text[scanned..start]);
        scanned = start;

        let in_url_tag = first_url_open.is_some_and(|open| open < start)
            && last_url_close.is_some_and(|close| close >= end);

        if depth > 0 || in_url_tag {
            continue;
        }

        out.push_str(&escape(&text[copied..start]));
        write_link(&text[start..end], &mut out);
        copied = end;
    }

    out.push_str(&escape(&text[copied..]));
    out
}
