//! Colors and geometry for rendered cards.

/// Card colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: String,
    pub card: String,
    pub border: String,
    pub text: String,
    pub muted: String,
    pub accent: String,
    /// Fill of the empty bar behind language segments.
    pub track: String,
    pub font_family: String,
    /// Segment colors, cycled when there are more languages than entries.
    pub palette: Vec<String>,
}

impl Theme {
    /// The Tokyo Night palette.
    pub fn tokyo_night() -> Self {
        Self {
            background: "#1a1b26".into(),
            card: "#24283b".into(),
            border: "#414868".into(),
            text: "#c0caf5".into(),
            muted: "#a9b1d6".into(),
            accent: "#7aa2f7".into(),
            track: "#1f2335".into(),
            font_family: "ui-sans-serif, system-ui, -apple-system, Segoe UI".into(),
            palette: [
                "#7aa2f7", "#bb9af7", "#2ac3de", "#9ece6a", "#f7768e", "#e0af68", "#7dcfff",
                "#c0caf5",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        }
    }

    pub fn palette_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return &self.accent;
        }
        &self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::tokyo_night()
    }
}

/// Fixed card geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub line_height: u32,
    pub bar_height: u32,
    /// Narrowest segment drawn in the language bar.
    pub min_segment_width: u32,
    pub legend_line_height: u32,
}

impl Layout {
    /// Width available between the left and right padding.
    pub fn inner_width(&self) -> u32 {
        self.width.saturating_sub(self.padding * 2)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 495,
            height: 195,
            padding: 18,
            line_height: 22,
            bar_height: 10,
            min_segment_width: 2,
            legend_line_height: 20,
        }
    }
}

/// Everything a renderer needs besides the content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardStyle {
    pub theme: Theme,
    pub layout: Layout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let theme = Theme::tokyo_night();
        assert_eq!(theme.palette_color(0), "#7aa2f7");
        assert_eq!(theme.palette_color(8), "#7aa2f7");
        assert_eq!(theme.palette_color(9), "#bb9af7");
    }

    #[test]
    fn test_empty_palette_falls_back_to_accent() {
        let theme = Theme {
            palette: Vec::new(),
            ..Theme::tokyo_night()
        };
        assert_eq!(theme.palette_color(3), theme.accent);
    }

    #[test]
    fn test_inner_width() {
        assert_eq!(Layout::default().inner_width(), 459);
    }
}
