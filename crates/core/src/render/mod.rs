//! SVG rendering of README cards.
//!
//! Renderers are pure: they take the content, a generation timestamp and a
//! [`CardStyle`], and return the SVG document as a string. Writing it out is
//! the caller's job.

pub mod bars;
pub mod card;
pub mod theme;

use chrono::{DateTime, Utc};

pub use bars::{render_language_bars, segment_widths};
pub use card::render_card;
pub use theme::{CardStyle, Layout, Theme};

/// Escape text for use in SVG element content and attribute values.
pub fn svg_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Timestamp shown in the card's top-right corner.
pub fn format_generated_at(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Opening tag, background and card frame shared by every card.
fn open_svg(style: &CardStyle) -> String {
    let Layout { width, height, .. } = style.layout;
    let t = &style.theme;
    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            "  <rect x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" rx=\"16\" fill=\"{bg}\"/>\n",
            "  <rect x=\"10\" y=\"10\" width=\"{iw}\" height=\"{ih}\" rx=\"14\" fill=\"{card}\" stroke=\"{border}\" stroke-width=\"1\"/>\n",
        ),
        w = width,
        h = height,
        iw = width.saturating_sub(20),
        ih = height.saturating_sub(20),
        bg = t.background,
        card = t.card,
        border = t.border,
    )
}

/// A `<text>` node; `anchor_end` right-aligns it on `x`.
fn text_node(
    style: &CardStyle,
    x: u32,
    y: u32,
    fill: &str,
    size: u32,
    anchor_end: bool,
    content: &str,
) -> String {
    let anchor = if anchor_end { " text-anchor=\"end\"" } else { "" };
    format!(
        "<text x=\"{x}\" y=\"{y}\"{anchor} fill=\"{fill}\" font-size=\"{size}\" font-family=\"{font}\">{text}</text>",
        font = style.theme.font_family,
        text = svg_escape(content),
    )
}

/// Title on the left and timestamp on the right of the header line.
fn header(style: &CardStyle, title: &str, generated_at: DateTime<Utc>) -> String {
    let l = &style.layout;
    let t = &style.theme;
    let y = l.padding + 20;
    format!(
        "  {}\n  {}\n",
        text_node(style, l.padding, y, &t.text, 18, false, title),
        text_node(
            style,
            l.width.saturating_sub(l.padding),
            y,
            &t.muted,
            11,
            true,
            &format_generated_at(generated_at),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_escape_all_specials() {
        assert_eq!(
            svg_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(svg_escape("plain"), "plain");
    }

    #[test]
    fn test_generated_at_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
        assert_eq!(format_generated_at(at), "2024-03-09 07:05 UTC");
    }
}
