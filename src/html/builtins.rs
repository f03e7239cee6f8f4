//! Built-in tag definitions, with their validators and renderers.
//! Renderers receive content that is already safe HTML (escaped, or produced by a nested parse) and
//! must escape any parameter they emit.
use std::sync::LazyLock;

use regex::Regex;

use super::{escape, imagemap};
use crate::registry::{TagDefinition, TagFlags};

/// Title shown on a spoiler box without one of its own.
pub const DEFAULT_BOX_TITLE: &str = "SPOILER";

/// Inclusive bounds of `[size=...]`, as a percentage of the normal font size.
pub const FONT_SIZE_RANGE: (i64, i64) = (30, 200);

/// Color names accepted by `[color=...]` in addition to hex codes.
pub const COLOR_NAMES: &[&str] = &[
    "aqua", "black", "blue", "brown", "cyan", "fuchsia", "gold", "gray", "green", "grey", "indigo",
    "lime", "magenta", "maroon", "navy", "olive", "orange", "pink", "purple", "red", "silver",
    "teal", "violet", "white", "yellow",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        log::error!("Failed to compile pattern {pattern}: {e}\n Falling back to never matching regex.");
        #[allow(clippy::expect_used, reason = "This pattern is guaranteed to be valid")]
        let never = Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile");
        never
    })
}

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| compile(r"^#[0-9a-fA-F]{3,6}$"));

static WEB_URL: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^https?://[^\s<>]+$"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"^[^\s@<>"'\[\]]+@[^\s@<>"'\[\]]+\.[^\s@<>"'\[\]]+$"#));

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?i)^https?://[^\s<>"']+\.(?:png|jpe?g|gif|webp|bmp|svg)(?:[?#][^\s<>"']*)?$"#)
});

static AUDIO_URL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?i)^https?://[^\s<>"']+\.(?:mp3|ogg|oga|wav|m4a|aac|flac|opus)(?:[?#][^\s<>"']*)?$"#)
});

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9_-]{11}$"));

static USER_ID: LazyLock<Regex> = LazyLock::new(|| compile(r"^[0-9]+$"));

macro_rules! simple_tag {
    ($doc:expr, $name:ident, $open:expr, $close:expr) => {
        #[doc = $doc]
        #[doc = "# Exact output"]
        #[doc = "```html"]
        #[doc = $open]
        #[doc = " contents"]
        #[doc = $close]
        #[doc = "```"]
        pub fn $name(content: &str, _: Option<&str>) -> String {
            let mut out = String::with_capacity($open.len() + content.len() + $close.len());
            out.push_str($open);
            out.push_str(content);
            out.push_str($close);
            out
        }
    };
}

simple_tag! {"`[b]`, strong emphasis.", render_bold, "<strong>", "</strong>"}
simple_tag! {"`[i]`, emphasis.", render_italic, "<em>", "</em>"}
simple_tag! {"`[u]`, underline.", render_underline, "<u>", "</u>"}
simple_tag! {"`[s]` and `[strike]`, struck-through text.", render_strike, "<del>", "</del>"}
simple_tag! {"`[centre]`, horizontally centered content.", render_centre, "<center>", "</center>"}
simple_tag! {"`[c]`, inline code. Never parsed.", render_inline_code, "<code>", "</code>"}
simple_tag! {"`[code]`, preformatted block. Never parsed.", render_code, "<pre>", "</pre>"}
simple_tag! {"`[heading]`, a section heading.", render_heading, "<h2>", "</h2>"}
simple_tag! {"`[notice]`, a highlighted panel.", render_notice, "<div class=\"well\">", "</div>"}
simple_tag! {"`[spoiler]`, inline text hidden until interacted with.", render_spoiler, "<span class=\"spoiler\">", "</span>"}

/// Strip one layer of surrounding double quotes and whitespace from a parameter.
fn unquote(parameter: &str) -> &str {
    let trimmed = parameter.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
}

/// Trim whitespace and line breaks (raw or already converted) from both ends of rendered content.
fn trim_breaks(mut html: &str) -> &str {
    loop {
        let trimmed = html
            .trim()
            .trim_start_matches("<br />")
            .trim_end_matches("<br />");
        if trimmed.len() == html.len() {
            return trimmed;
        }
        html = trimmed;
    }
}

/// Link target of `[url]`: the parameter (minus one leading `=`) if present, the content otherwise.
fn url_target<'a>(parameter: Option<&'a str>, content: &'a str) -> &'a str {
    match parameter {
        Some(p) => {
            let p = unquote(p);
            p.strip_prefix('=').unwrap_or(p).trim()
        }
        None => content.trim(),
    }
}

pub fn validate_color(parameter: Option<&str>, _: &str) -> bool {
    let Some(color) = parameter.map(unquote) else {
        return false;
    };

    HEX_COLOR.is_match(color) || COLOR_NAMES.iter().any(|c| c.eq_ignore_ascii_case(color))
}

pub fn render_color(content: &str, parameter: Option<&str>) -> String {
    let color = parameter.map(unquote).unwrap_or_default();
    format!("<span style=\"color: {};\">{content}</span>", escape(color))
}

pub fn validate_size(parameter: Option<&str>, _: &str) -> bool {
    let (min, max) = FONT_SIZE_RANGE;
    parameter
        .and_then(|p| unquote(p).parse::<i64>().ok())
        .is_some_and(|size| (min..=max).contains(&size))
}

/// Renders `[size=N]`. The size is clamped again here so the renderer is safe on its own.
pub fn render_size(content: &str, parameter: Option<&str>) -> String {
    let (min, max) = FONT_SIZE_RANGE;
    let size = parameter
        .and_then(|p| unquote(p).parse::<i64>().ok())
        .unwrap_or(100)
        .clamp(min, max);
    format!("<span style=\"font-size: {size}%;\">{content}</span>")
}

pub fn render_quote(content: &str, parameter: Option<&str>) -> String {
    match parameter.map(unquote).filter(|author| !author.is_empty()) {
        Some(author) => format!(
            "<blockquote><h4>{} wrote:</h4>{content}</blockquote>",
            escape(author)
        ),
        None => format!("<blockquote>{content}</blockquote>"),
    }
}

/// Renders `[list]` and `[list=x]`. Items are separated by `[*]`; empty items are dropped.
pub fn render_list(content: &str, parameter: Option<&str>) -> String {
    let element = if parameter.is_some() { "ol" } else { "ul" };

    let mut out = format!("<{element}>");
    for item in content.split("[*]").map(trim_breaks).filter(|i| !i.is_empty()) {
        out.push_str("<li>");
        out.push_str(item);
        out.push_str("</li>");
    }
    out.push_str("</");
    out.push_str(element);
    out.push('>');
    out
}

/// Renders `[box=title]` and `[spoilerbox]` as a collapsible container.
pub fn render_box(content: &str, parameter: Option<&str>) -> String {
    let title = parameter
        .map(unquote)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_BOX_TITLE);

    format!(
        "<div class=\"js-spoilerbox bbcode-spoilerbox\">\
         <button type=\"button\" class=\"js-spoilerbox__link bbcode-spoilerbox__link\">\
         <span class=\"bbcode-spoilerbox__link-icon\"></span>{}</button>\
         <div class=\"js-spoilerbox__body bbcode-spoilerbox__body\">{}</div></div>",
        escape(title),
        trim_breaks(content)
    )
}

pub fn render_spoilerbox(content: &str, _: Option<&str>) -> String {
    render_box(content, None)
}

pub fn validate_url(parameter: Option<&str>, content: &str) -> bool {
    WEB_URL.is_match(url_target(parameter, content))
}

/// Renders `[url]`. Without a parameter, the (escaped) content is both the target and the text.
/// With one, the content is the parsed display text.
pub fn render_url(content: &str, parameter: Option<&str>) -> String {
    let href = match parameter {
        Some(_) => escape(url_target(parameter, content)),
        None => content.trim().to_owned(),
    };
    format!("<a rel=\"nofollow\" href=\"{href}\">{content}</a>")
}

pub fn validate_email(parameter: Option<&str>, content: &str) -> bool {
    let address = match parameter {
        Some(p) => unquote(p),
        None => content.trim(),
    };
    EMAIL.is_match(address)
}

pub fn render_email(content: &str, parameter: Option<&str>) -> String {
    let address = match parameter {
        Some(p) => escape(unquote(p)),
        None => content.trim().to_owned(),
    };
    format!("<a rel=\"nofollow\" href=\"mailto:{address}\">{content}</a>")
}

pub fn validate_image(_: Option<&str>, content: &str) -> bool {
    IMAGE_URL.is_match(content.trim())
}

pub fn render_image(content: &str, _: Option<&str>) -> String {
    format!("<img loading=\"lazy\" src=\"{}\" alt=\"\" />", content.trim())
}

pub fn validate_youtube(_: Option<&str>, content: &str) -> bool {
    YOUTUBE_ID.is_match(content.trim())
}

pub fn render_youtube(content: &str, _: Option<&str>) -> String {
    format!(
        "<div class=\"bbcode__video-box\"><iframe class=\"bbcode__video\" \
         src=\"https://www.youtube.com/embed/{}?rel=0\" frameborder=\"0\" allowfullscreen></iframe></div>",
        content.trim()
    )
}

pub fn validate_audio(_: Option<&str>, content: &str) -> bool {
    AUDIO_URL.is_match(content.trim())
}

pub fn render_audio(content: &str, _: Option<&str>) -> String {
    format!(
        "<audio controls=\"controls\" preload=\"none\" src=\"{}\"></audio>",
        content.trim()
    )
}

pub fn validate_profile(parameter: Option<&str>, content: &str) -> bool {
    let name = content.trim();
    if name.is_empty() || name.contains('\n') {
        return false;
    }

    parameter.map_or(true, |id| USER_ID.is_match(unquote(id)))
}

/// Renders `[profile]name[/profile]` and `[profile=id]name[/profile]` as a user link.
pub fn render_profile(content: &str, parameter: Option<&str>) -> String {
    let name = content.trim();
    match parameter.map(unquote) {
        Some(id) => {
            let id = escape(id);
            format!("<a class=\"js-usercard\" data-user-id=\"{id}\" href=\"/users/{id}\">{name}</a>")
        }
        None => format!("<a class=\"js-usercard\" href=\"/users/@{name}\">{name}</a>"),
    }
}

pub fn render_imagemap(content: &str, _: Option<&str>) -> String {
    imagemap::render(content)
}

/// Returns every built-in tag, block tags first, each group in processing order.
pub fn standard_tags() -> Vec<TagDefinition> {
    use TagFlags as F;

    let block = F::BLOCK;
    let nested = F::NESTED_CONTENT;
    let optional = F::HAS_PARAMETER;
    let required = F::HAS_PARAMETER | F::PARAMETER_REQUIRED;
    // In the bare form the body is also the target, so only `[tag=value]` parses it.
    let link = F::HAS_PARAMETER | F::NESTED_WITH_PARAMETER | F::LINK;

    vec![
        TagDefinition::new("imagemap", block | F::RAW_CONTENT, render_imagemap),
        TagDefinition::new("box", block | optional | nested, render_box),
        TagDefinition::new("spoilerbox", block | nested, render_spoilerbox),
        TagDefinition::new("code", block, render_code),
        TagDefinition::new("list", block | optional | nested, render_list),
        TagDefinition::new("notice", block | nested, render_notice),
        TagDefinition::new("quote", block | optional | nested, render_quote),
        TagDefinition::new("heading", block | nested, render_heading),
        TagDefinition::new("audio", F::empty(), render_audio).with_validator(validate_audio),
        TagDefinition::new("b", nested, render_bold),
        TagDefinition::new("centre", nested, render_centre),
        TagDefinition::new("c", F::empty(), render_inline_code),
        TagDefinition::new("color", required | nested, render_color).with_validator(validate_color),
        TagDefinition::new("email", link, render_email).with_validator(validate_email),
        TagDefinition::new("img", F::empty(), render_image).with_validator(validate_image),
        TagDefinition::new("i", nested, render_italic),
        TagDefinition::new("size", required | nested, render_size).with_validator(validate_size),
        TagDefinition::new("spoiler", nested, render_spoiler),
        TagDefinition::new("s", nested, render_strike),
        TagDefinition::new("strike", nested, render_strike),
        TagDefinition::new("u", nested, render_underline),
        TagDefinition::new("url", link, render_url).with_validator(validate_url),
        TagDefinition::new("youtube", F::empty(), render_youtube).with_validator(validate_youtube),
        TagDefinition::new("profile", link, render_profile).with_validator(validate_profile),
    ]
}
