//! Stacked language bar with a two-column legend.

use chrono::{DateTime, Utc};

use super::{header, open_svg, text_node, CardStyle};
use crate::stats::LanguageBytes;

const LEGEND_ROWS: usize = 4;
const LEGEND_COLUMNS: usize = 2;
const SUBTITLE: &str = "Top languages by GitHub Linguist bytes (non-fork repos)";

/// Pixel width of each bar segment.
///
/// Every returned width is at least `min_width` and the widths sum to at most
/// `bar_width`. The minimum is reserved first and the remaining pixels are
/// shared in proportion to byte counts. When not every language fits at the
/// minimum width, the trailing (smallest, for ranked input) ones are dropped,
/// so the result can be shorter than `langs`.
pub fn segment_widths(langs: &[LanguageBytes], bar_width: u32, min_width: u32) -> Vec<u32> {
    let fit = match min_width {
        0 => langs.len(),
        w => langs.len().min((bar_width / w) as usize),
    };
    let shown = &langs[..fit];
    if shown.is_empty() {
        return Vec::new();
    }

    let total = u128::from(shown.iter().map(|l| l.bytes).sum::<u64>().max(1));
    let spare = u128::from(bar_width - min_width * fit as u32);

    shown
        .iter()
        .map(|l| min_width + (spare * u128::from(l.bytes) / total) as u32)
        .collect()
}

/// Share of `bytes` in `total` as a percentage, `0.0` for an empty total.
fn percent(bytes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    bytes as f64 / total as f64 * 100.0
}

/// Render the top-languages card from ranked languages (largest first).
pub fn render_language_bars(
    title: &str,
    langs: &[LanguageBytes],
    generated_at: DateTime<Utc>,
    style: &CardStyle,
) -> String {
    let l = &style.layout;
    let t = &style.theme;
    let x0 = l.padding;
    let y0 = l.padding + 46;
    let bar_w = l.inner_width();
    let right = l.width.saturating_sub(l.padding);

    let mut svg = open_svg(style);
    svg.push_str(&header(style, title, generated_at));
    svg.push_str("  ");
    svg.push_str(&text_node(style, x0, l.padding + 40, &t.muted, 13, false, SUBTITLE));
    svg.push('\n');
    svg.push_str(&format!(
        "  <rect x=\"{x0}\" y=\"{y0}\" width=\"{bar_w}\" height=\"{h}\" rx=\"4\" fill=\"{track}\" stroke=\"{border}\" stroke-width=\"1\"/>\n",
        h = l.bar_height,
        track = t.track,
        border = t.border,
    ));

    let widths = segment_widths(langs, bar_w, l.min_segment_width);
    let mut x = x0;
    svg.push_str("  ");
    for (i, w) in widths.iter().enumerate() {
        svg.push_str(&format!(
            "<rect x=\"{x}\" y=\"{y0}\" width=\"{w}\" height=\"{h}\" rx=\"4\" fill=\"{color}\"/>",
            h = l.bar_height,
            color = t.palette_color(i),
        ));
        x += w;
    }
    svg.push('\n');

    let total: u64 = langs.iter().map(|lang| lang.bytes).sum();
    let legend_top = y0 + 30;
    let column_width = bar_w / LEGEND_COLUMNS as u32;

    if langs.is_empty() {
        svg.push_str("  ");
        svg.push_str(&text_node(style, x0, legend_top, &t.muted, 13, false, "No language data"));
        svg.push('\n');
    }

    for (i, lang) in langs.iter().take(LEGEND_ROWS * LEGEND_COLUMNS).enumerate() {
        let column = i / LEGEND_ROWS;
        let row = i % LEGEND_ROWS;
        let cx = x0 + column as u32 * column_width;
        let y = legend_top + row as u32 * l.legend_line_height;
        let pct_x = if column + 1 == LEGEND_COLUMNS {
            right
        } else {
            cx + column_width.saturating_sub(12)
        };

        svg.push_str(&format!(
            "  <circle cx=\"{}\" cy=\"{}\" r=\"5\" fill=\"{}\"/>",
            cx + 6,
            y.saturating_sub(5),
            t.palette_color(i),
        ));
        svg.push_str(&text_node(style, cx + 18, y, &t.muted, 13, false, &lang.name));
        svg.push_str(&text_node(
            style,
            pct_x,
            y,
            &t.text,
            13,
            true,
            &format!("{:.1}%", percent(lang.bytes, total)),
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}
