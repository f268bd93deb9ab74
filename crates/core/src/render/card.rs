//! Label/value card (stats and streak cards).

use chrono::{DateTime, Utc};

use super::{header, open_svg, text_node, CardStyle};

/// Render a card with a title, one row per `(label, value)` pair and an
/// optional footer line pinned to the bottom edge.
pub fn render_card(
    title: &str,
    lines: &[(String, String)],
    footer: Option<&str>,
    generated_at: DateTime<Utc>,
    style: &CardStyle,
) -> String {
    let l = &style.layout;
    let t = &style.theme;
    let right = l.width.saturating_sub(l.padding);

    let mut svg = open_svg(style);
    svg.push_str(&header(style, title, generated_at));

    let mut y = l.padding + 28;
    for (label, value) in lines {
        svg.push_str("  ");
        svg.push_str(&text_node(style, l.padding, y, &t.muted, 13, false, label));
        svg.push_str(&text_node(style, right, y, &t.text, 13, true, value));
        svg.push('\n');
        y += l.line_height;
    }

    if let Some(footer) = footer.filter(|f| !f.is_empty()) {
        let fy = l.height.saturating_sub(l.padding);
        svg.push_str("  ");
        svg.push_str(&text_node(style, l.padding, fy, &t.accent, 12, false, footer));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}
