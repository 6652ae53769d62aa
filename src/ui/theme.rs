//! Colour palette shared by every pane

use ratatui::style::Color;

pub struct Theme {
    pub text: Color,
    pub accent: Color,
    pub muted: Color,
    /// Coverage markers and successful runs
    pub covered: Color,
    pub failed: Color,

    // Syntax highlighting
    pub keyword: Color,
    pub literal: Color,
    pub call: Color,

    pub border_focused: Color,
    pub border_normal: Color,
    /// Status bar and selected-row background
    pub panel_bg: Color,
    pub covered_line_bg: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    text: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(137, 180, 250),
    muted: Color::Rgb(108, 112, 134),
    covered: Color::Rgb(166, 227, 161),
    failed: Color::Rgb(243, 139, 168),

    keyword: Color::Rgb(203, 166, 247),
    literal: Color::Rgb(250, 179, 135),
    call: Color::Rgb(249, 226, 175),

    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(88, 91, 112),
    panel_bg: Color::Rgb(49, 50, 68),
    covered_line_bg: Color::Rgb(36, 58, 46),
};
