//! The `[imagemap]` body language.
//!
//! ```text
//! [imagemap]
//! https://example.com/background.png
//! 10 10 20 20 https://example.com Link title
//! 50 50 10 10 # #Informational region
//! [/imagemap]
//! ```
//!
//! The first non-empty line is the background image. Every following line is
//! `left top width height href [title...]`, with positions and sizes as percentages of the image.
//! An `href` of `#` makes a hover-only region.

use super::escape;

/// Sentinel `href` for regions that do not link anywhere.
const NO_LINK: &str = "#";

struct Region<'a> {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    href: &'a str,
    title: &'a str,
}

impl<'a> Region<'a> {
    /// Parse a single region line. Returns [None] for lines that are too short or not numeric.
    fn parse(line: &'a str) -> Option<Self> {
        let mut fields = line.splitn(6, ' ');
        let mut number = || {
            fields
                .next()?
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
        };

        let (left, top, width, height) = (number()?, number()?, number()?, number()?);
        let href = fields.next().filter(|h| !h.is_empty())?;
        let title = fields.next().unwrap_or_default().trim();
        let title = title.strip_prefix('#').map(str::trim).unwrap_or(title);

        Some(Self {
            left,
            top,
            width,
            height,
            href,
            title,
        })
    }

    fn is_link(&self) -> bool {
        if self.href == NO_LINK {
            return false;
        }

        let lower = self.href.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with('/')
    }

    fn write(&self, out: &mut String) {
        let style = format!(
            "left:{}%;top:{}%;width:{}%;height:{}%;",
            self.left, self.top, self.width, self.height
        );
        let title = escape(self.title);

        if self.is_link() {
            out.push_str(&format!(
                "<a class=\"imagemap__link\" rel=\"nofollow\" href=\"{}\" style=\"{style}\" title=\"{title}\"></a>",
                escape(self.href)
            ));
        } else {
            out.push_str(&format!(
                "<span class=\"imagemap__link\" style=\"{style}\" title=\"{title}\"></span>"
            ));
        }
    }
}

/// Alt text for the background: the last path segment of the URL, without any query string.
fn alt_text(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Render an imagemap body to HTML.
/// # Remarks
/// A body with no region lines is not an imagemap. It is echoed back as escaped source text.
pub fn render(body: &str) -> String {
    let mut lines = body.lines().map(str::trim).skip_while(|l| l.is_empty());

    let image = lines.next();
    let regions: Vec<&str> = lines.filter(|l| !l.is_empty()).collect();

    let Some(image) = image.filter(|_| !regions.is_empty()) else {
        return escape(&format!("[imagemap]{body}[/imagemap]")).replace('\n', "<br />");
    };

    let mut out = format!(
        "<div class=\"imagemap\"><img class=\"imagemap__image\" loading=\"lazy\" src=\"{}\" alt=\"{}\" />",
        escape(image),
        escape(alt_text(image))
    );

    for line in regions {
        match Region::parse(line) {
            Some(region) => region.write(&mut out),
            None => log::debug!("Skipping malformed imagemap line: {line:?}"),
        }
    }

    out.push_str("</div>");
    out
}
