use ratatui::style::Color;

use crate::render::PALETTE_SIZE;
use crate::ui_state::Theme;

/// Colors used by the painter for one theme.
pub struct Palette {
    pub background: Color,
    pub panel: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub accent_warm: Color,
    pub border: Color,
    pub border_focus: Color,
    pub error: Color,
    pub success: Color,
    /// Foreground drawn on top of token backgrounds.
    pub token_fg: Color,
    pub tokens: [Color; PALETTE_SIZE],
}

// Copper Sapphire Night
static DARK: Palette = Palette {
    background: Color::Rgb(12, 12, 16),
    panel: Color::Rgb(18, 18, 24),
    text_primary: Color::Rgb(240, 240, 245),
    text_secondary: Color::Rgb(180, 180, 190),
    text_muted: Color::Rgb(105, 116, 133),
    accent: Color::Rgb(101, 150, 243),       // #6596F3 sapphire
    accent_warm: Color::Rgb(164, 103, 38),   // #A46726 warm brown
    border: Color::Rgb(45, 50, 60),
    border_focus: Color::Rgb(101, 150, 243),
    error: Color::Rgb(204, 92, 68),          // #CC5C44 burgundy
    success: Color::Rgb(131, 179, 102),      // #83B366 olive
    token_fg: Color::Rgb(12, 12, 16),
    tokens: [
        Color::Rgb(101, 150, 243),
        Color::Rgb(216, 180, 169),
        Color::Rgb(131, 179, 102),
        Color::Rgb(211, 164, 234),
        Color::Rgb(234, 208, 148),
        Color::Rgb(178, 220, 226),
        Color::Rgb(204, 92, 68),
        Color::Rgb(164, 103, 38),
        Color::Rgb(84, 112, 156),
        Color::Rgb(171, 178, 191),
    ],
};

// Copper Sapphire Morning
static LIGHT: Palette = Palette {
    background: Color::Rgb(248, 246, 242),
    panel: Color::Rgb(238, 235, 229),
    text_primary: Color::Rgb(28, 30, 36),
    text_secondary: Color::Rgb(70, 74, 84),
    text_muted: Color::Rgb(120, 126, 138),
    accent: Color::Rgb(54, 98, 196),
    accent_warm: Color::Rgb(138, 72, 38),    // #8A4826 copper
    border: Color::Rgb(200, 196, 188),
    border_focus: Color::Rgb(54, 98, 196),
    error: Color::Rgb(192, 57, 43),
    success: Color::Rgb(76, 128, 52),
    token_fg: Color::Rgb(28, 30, 36),
    tokens: [
        Color::Rgb(190, 212, 250),
        Color::Rgb(240, 214, 206),
        Color::Rgb(206, 230, 190),
        Color::Rgb(232, 210, 244),
        Color::Rgb(248, 232, 190),
        Color::Rgb(204, 236, 240),
        Color::Rgb(244, 196, 186),
        Color::Rgb(232, 206, 170),
        Color::Rgb(196, 208, 228),
        Color::Rgb(220, 222, 228),
    ],
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Light => &LIGHT,
        Theme::Dark => &DARK,
    }
}

impl Palette {
    pub fn token(&self, slot: usize) -> Color {
        self.tokens[slot % PALETTE_SIZE]
    }
}
