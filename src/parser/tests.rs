use std::thread;

use crate::{
    parse, parse_bytes, BBParser, ParseError, ParseResult, ParserConfig, ParserFeature,
    TagDefinition, TagFlags, TagRegistry,
};

fn html(input: &str) -> String {
    let result = parse(input);
    assert!(result.valid, "unexpected errors: {:?}", result.errors);
    let inner = result
        .html
        .strip_prefix("<div class=\"bbcode\">")
        .and_then(|h| h.strip_suffix("</div>"))
        .expect("output is wrapped in the root container");
    inner.to_owned()
}

#[test]
pub fn empty_input() {
    let expected = ParseResult {
        html: "<div class=\"bbcode\"></div>".to_owned(),
        errors: vec![],
        valid: true,
    };
    assert_eq!(parse(""), expected);
    assert_eq!(parse(" \n\t "), expected);
}

#[test]
pub fn plain_text() {
    assert_eq!(html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    assert_eq!(html("one\ntwo\r\nthree"), "one<br />two<br />three");
}

#[test]
pub fn bold() {
    assert_eq!(html("[b]x[/b]"), "<strong>x</strong>");
    assert_eq!(html("[B]x[/b]"), "<strong>x</strong>");
    assert_eq!(html("[b][i]x[/i][/b]"), "<strong><em>x</em></strong>");
}

#[test]
pub fn color() {
    assert_eq!(
        html("[color=red]x[/color]"),
        "<span style=\"color: red;\">x</span>"
    );

    let result = parse("[color=notacolor]x[/color]");
    assert_eq!(result.html, "<div class=\"bbcode\">[color=notacolor]x[/color]</div>");
    assert_eq!(result.errors, ["Invalid value \"notacolor\" for [color] tag"]);
    assert!(!result.valid);
}

#[test]
pub fn size_out_of_range() {
    let result = parse("[size=250]x[/size]");
    assert_eq!(result.html, "<div class=\"bbcode\">[size=250]x[/size]</div>");
    assert_eq!(result.errors.len(), 1);
    assert!(!result.valid);

    assert_eq!(
        html("[size=150]x[/size]"),
        "<span style=\"font-size: 150%;\">x</span>"
    );
}

#[test]
pub fn rejected_tag_keeps_inner_tags() {
    let result = parse("[size=999][b]x[/b][/size]");
    assert_eq!(
        result.html,
        "<div class=\"bbcode\">[size=999]<strong>x</strong>[/size]</div>"
    );
    assert_eq!(
        result.errors,
        [ParseError::InvalidParameter {
            tag: "size".to_owned(),
            parameter: "999".to_owned()
        }
        .to_string()]
    );
}

#[test]
pub fn errors_follow_pass_order() {
    let result = parse("[size=1]a[/size] [img]nope[/img] [color=x]b[/color]");
    assert_eq!(
        result.errors,
        [
            "Invalid value \"x\" for [color] tag",
            "Invalid content for [img] tag",
            "Invalid value \"1\" for [size] tag",
        ]
    );
}

#[test]
pub fn list() {
    let out = html("[list][*]a[*]b[/list]");
    assert_eq!(out, "<ul><li>a</li><li>b</li></ul>");
    assert_eq!(out.matches("<li>").count(), 2);

    assert_eq!(
        html("[list=1]\n[*]a\n[*][b]b[/b]\n[/list]"),
        "<ol><li>a</li><li><strong>b</strong></li></ol>"
    );
}

#[test]
pub fn url_and_bare_link() {
    let out = html("[url=https://example.com]text[/url] and https://example.org/x");
    assert_eq!(
        out,
        "<a rel=\"nofollow\" href=\"https://example.com\">text</a> and \
         <a rel=\"nofollow\" href=\"https://example.org/x\">https://example.org/x</a>"
    );
}

#[test]
pub fn url_content_is_not_linked_twice() {
    assert_eq!(
        html("[url]https://example.com[/url]"),
        "<a rel=\"nofollow\" href=\"https://example.com\">https://example.com</a>"
    );
    assert_eq!(
        html("[url=https://a.com]see https://b.com[/url]"),
        "<a rel=\"nofollow\" href=\"https://a.com\">see https://b.com</a>"
    );

    // Linking is only switched off inside the display text.
    let out = html("[url=https://a.com]https://b.com[/url] https://c.com");
    assert_eq!(out.matches("<a ").count(), 2);
    assert!(out.ends_with("<a rel=\"nofollow\" href=\"https://c.com\">https://c.com</a>"));
}

#[test]
pub fn link_display_text_is_parsed() {
    assert_eq!(
        html("[url=https://example.com][b]bold[/b][/url]"),
        "<a rel=\"nofollow\" href=\"https://example.com\"><strong>bold</strong></a>"
    );
    assert_eq!(
        html("[url=\"https://example.com\"][i]a[/i] [color=red]b[/color][/url]"),
        "<a rel=\"nofollow\" href=\"https://example.com\"><em>a</em> \
         <span style=\"color: red;\">b</span></a>"
    );
    assert_eq!(
        html("[email=a@b.co][i]Mail[/i][/email]"),
        "<a rel=\"nofollow\" href=\"mailto:a@b.co\"><em>Mail</em></a>"
    );

    // Without a parameter the body is the target, so it is never parsed.
    let result = parse("[url][b]https://example.com[/b][/url]");
    assert_eq!(result.errors, ["Invalid content for [url] tag"]);
}

/// Assert that every element in `html` is closed, and closed in order.
fn assert_well_formed(html: &str) {
    let mut open = vec![];
    for tag in html.split('<').skip(1) {
        let tag = &tag[..tag.find('>').expect("tag is terminated")];
        if let Some(name) = tag.strip_prefix('/') {
            assert_eq!(open.pop(), Some(name), "misnested </{name}> in {html}");
        } else if !tag.ends_with('/') {
            open.push(tag.split(' ').next().unwrap_or(tag));
        }
    }
    assert!(open.is_empty(), "unclosed {open:?} in {html}");
}

#[test]
pub fn list_separators_inside_children() {
    let out = html("[list][*]a[code][*]x[/code][/list]");
    assert_eq!(out, "<ul><li>a<pre>[*]x</pre></li></ul>");

    assert_eq!(
        html("[list][*]a [c][*]b[/c][*]c[/list]"),
        "<ul><li>a <code>[*]b</code></li><li>c</li></ul>"
    );
    assert_eq!(
        html("[list][*][url=https://x.com]a[*]b[/url][/list]"),
        "<ul><li><a rel=\"nofollow\" href=\"https://x.com\">a[*]b</a></li></ul>"
    );
}

#[test]
pub fn container_bodies_stay_closed() {
    let inputs = [
        "[list][*]a[code][*]x[/code][/list]",
        "[list=1][*][c][*][/c][*][quote][*]q[/quote][/list]",
        "[list][*]a<br />[*]b<br />[/list]",
        "[list]\n[*][box=t][*]x[/box]\n[*]y\n[/list]",
        "[box]<br />x<br />[/box]",
        "[box=T]\n[quote][code]</div>[/code][/quote]\n[/box]",
        "[quote=\"[*]\"][list][*][b]a[/b][*]</li>[/list][/quote]",
        "[spoilerbox][url=https://x.com][box]y[/box][/url][/spoilerbox]",
        "[notice][list][*][img]https://x.com/a.png[/img][*]https://x.com [/list][/notice]",
    ];

    for input in inputs {
        let result = parse(input);
        assert!(result.valid, "{input}: {:?}", result.errors);
        assert_well_formed(&result.html);
    }
}

#[test]
pub fn literal_breaks_are_text() {
    assert_eq!(
        html("[list][*]a<br />[*]b[/list]"),
        "<ul><li>a&lt;br /&gt;</li><li>b</li></ul>"
    );
    assert!(html("[box]<br />x<br />[/box]")
        .contains("<div class=\"js-spoilerbox__body bbcode-spoilerbox__body\">&lt;br /&gt;x&lt;br /&gt;</div>"));
}

#[test]
pub fn rendered_children_inside_containers() {
    let out = html("[box=T]\n[quote][code]</div>[/code][/quote]\n[/box]");
    assert!(out.ends_with(
        "<div class=\"js-spoilerbox__body bbcode-spoilerbox__body\">\
         <blockquote><pre>&lt;/div&gt;</pre></blockquote></div></div>"
    ));
}

#[test]
pub fn rejected_url_is_not_autolinked() {
    let result = parse("[url=javascript:alert(1)]https://example.com[/url]");
    assert!(!result.valid);
    assert!(!result.html.contains("<a "));

    let result = parse("[url]javascript:alert(1)[/url]");
    assert_eq!(result.errors, ["Invalid content for [url] tag"]);
}

#[test]
pub fn imagemap() {
    let out = html("[imagemap]\nimg.png\n10 10 20 20 https://x.com Label\n[/imagemap]");
    assert_eq!(out.matches("<img").count(), 1);
    assert_eq!(out.matches("<a ").count(), 1);
    assert_eq!(out.matches("href=\"https://x.com\"").count(), 1);
    assert!(out.contains("style=\"left:10%;top:10%;width:20%;height:20%;\""));
    assert!(out.contains("title=\"Label\""));
    assert!(!out.contains("<br />"));
}

#[test]
pub fn code_is_verbatim() {
    assert_eq!(
        html("[code]<b>not bold</b> https://x.com [b]y[/b][/code]"),
        "<pre>&lt;b&gt;not bold&lt;/b&gt; https://x.com [b]y[/b]</pre>"
    );
    assert_eq!(html("[code]a\nb[/code]"), "<pre>a\nb</pre>");
}

#[test]
pub fn code_restores_earlier_blocks() {
    // `box` runs before `code`, but the code body must still come out as written.
    assert_eq!(
        html("[code][box]x[/box][/code]"),
        "<pre>[box]x[/box]</pre>"
    );
}

#[test]
pub fn block_then_inline() {
    assert_eq!(
        html("[b][quote]x[/quote][/b]"),
        "<strong><blockquote>x</blockquote></strong>"
    );
    assert_eq!(
        html("[quote=\"Jane\"]hi [i]there[/i][/quote]\nbye"),
        "<blockquote><h4>Jane wrote:</h4>hi <em>there</em></blockquote><br />bye"
    );
}

#[test]
pub fn spoilers() {
    let out = html("[box=Secrets]\n[spoiler]x[/spoiler]\n[/box]");
    assert!(out.contains("</span>Secrets</button>"));
    assert!(out.contains(
        "<div class=\"js-spoilerbox__body bbcode-spoilerbox__body\"><span class=\"spoiler\">x</span></div>"
    ));
    assert!(html("[spoilerbox]x[/spoilerbox]").contains("</span>SPOILER</button>"));
}

#[test]
pub fn inert_markup() {
    assert_eq!(html("[marquee]x[/marquee]"), "[marquee]x[/marquee]");
    assert_eq!(html("[b]never closed"), "[b]never closed");
    assert_eq!(html("[/b]x[b]"), "[/b]x[b]");
}

#[test]
pub fn same_tag_nesting_is_shortest() {
    assert_eq!(html("[b][b]x[/b][/b]"), "<strong>[b]x</strong>[/b]");
}

#[test]
pub fn placeholder_characters_are_stripped() {
    assert_eq!(html("a\u{1A}0\u{1A}b"), "a0b");
    assert_eq!(html("[b]x[/b]\u{1A}0\u{1A}"), "<strong>x</strong>0");
}

#[test]
pub fn features_can_be_disabled() {
    let parser = BBParser::new().with_config(ParserConfig {
        feature_flags: ParserFeature::empty(),
    });
    assert_eq!(
        parser.parse("https://x.com\nnext").html,
        "<div class=\"bbcode\">https://x.com\nnext</div>"
    );
    assert_eq!(BBParser::new().config(), ParserConfig::default());
}

#[test]
pub fn invalid_utf8() {
    let result = parse_bytes(&[0xff, b'<']);
    assert!(!result.valid);
    assert_eq!(result.errors, [ParseError::InvalidInput.to_string()]);
    assert_eq!(result.html, "<div class=\"bbcode\">\u{FFFD}&lt;</div>");

    assert_eq!(parse_bytes(b"[b]x[/b]"), parse("[b]x[/b]"));
}

fn explode(_: &str, _: Option<&str>) -> String {
    panic!("renderer failure")
}

#[test]
pub fn panics_degrade_to_text() {
    let mut registry = TagRegistry::new();
    registry
        .register(TagDefinition::new("boom", TagFlags::empty(), explode))
        .unwrap();

    let result = BBParser::with_registry(&registry).parse("[boom]x[/boom] <i>");
    assert_eq!(result.html, "<div class=\"bbcode\">[boom]x[/boom] &lt;i&gt;</div>");
    assert_eq!(result.errors, [ParseError::Internal.to_string()]);
    assert!(!result.valid);
}

#[test]
pub fn custom_registry() {
    fn shout(content: &str, _: Option<&str>) -> String {
        format!("<span class=\"shout\">{content}</span>")
    }

    let mut registry = TagRegistry::new();
    registry
        .register(TagDefinition::new("shout", TagFlags::NESTED_CONTENT, shout))
        .unwrap();

    let parser = BBParser::with_registry(&registry);
    assert_eq!(
        parser.parse("[shout]a[b]b[/b][/shout]").html,
        "<div class=\"bbcode\"><span class=\"shout\">a[b]b[/b]</span></div>"
    );
}

#[test]
pub fn shared_between_threads() {
    let parser = BBParser::new();
    thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| s.spawn(move || parser.parse(&format!("[b]{i}[/b]"))))
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert_eq!(result.html, format!("<div class=\"bbcode\"><strong>{i}</strong></div>"));
        }
    });
}

#[test]
pub fn reparsing_output_keeps_entities_visible() {
    let first = parse("[b]Tom & Jerry[/b]");
    assert_eq!(
        first.html,
        "<div class=\"bbcode\"><strong>Tom &amp; Jerry</strong></div>"
    );

    // Rendered output fed back in is shown as text, not interpreted as markup.
    let second = parse(&first.html);
    assert!(second.valid);
    assert!(second.html.contains("&lt;strong&gt;Tom &amp;amp; Jerry&lt;/strong&gt;"));
}
