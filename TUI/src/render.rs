//! View models for encode/decode results.
//!
//! Everything here is pure: it turns an [`EncodeResult`] or decoded string into
//! plain data that `ui.rs` paints. Nothing in this module knows about the
//! terminal, so the rendering rules are testable on their own.

use unicode_width::UnicodeWidthStr;

use crate::backend::EncodeResult;
use crate::ui_state::DisplayMode;

/// Number of distinct token colors in the text view.
pub const PALETTE_SIZE: usize = 10;

pub const EMPTY_TOKENS_PLACEHOLDER: &str = "No tokens to display";
pub const IDS_LOADING_PLACEHOLDER: &str = "Loading...";
pub const TEXT_LOADING_PLACEHOLDER: &str = "Processing...";
pub const DECODE_LOADING_PLACEHOLDER: &str = "Processing...";
pub const NO_OUTPUT_PLACEHOLDER: &str = "(No output)";

/// Decoded text shorter than this many characters is emphasised.
const SHORT_DECODE_CHARS: usize = 50;

/// One clickable token cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUnit {
    pub index: usize,
    pub token_id: i64,
    pub label: String,
    /// Color slot in the token palette; ID cells are uncolored.
    pub palette_slot: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenPane {
    /// Nothing encoded yet, or cleared after an error.
    #[default]
    Idle,
    Loading(&'static str),
    Empty,
    Units(Vec<TokenUnit>),
}

impl TokenPane {
    pub fn units(&self) -> &[TokenUnit] {
        match self {
            TokenPane::Units(units) => units,
            _ => &[],
        }
    }
}

/// Both token views, always built together from the same result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenViews {
    pub ids: TokenPane,
    pub text: TokenPane,
}

impl TokenViews {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            ids: TokenPane::Loading(IDS_LOADING_PLACEHOLDER),
            text: TokenPane::Loading(TEXT_LOADING_PLACEHOLDER),
        }
    }

    pub fn from_result(result: &EncodeResult) -> Self {
        Self {
            ids: id_view(result),
            text: text_view(result),
        }
    }

    pub fn pane(&self, mode: DisplayMode) -> &TokenPane {
        match mode {
            DisplayMode::Ids => &self.ids,
            DisplayMode::Text => &self.text,
        }
    }
}

pub fn id_view(result: &EncodeResult) -> TokenPane {
    if result.is_empty() {
        return TokenPane::Empty;
    }
    TokenPane::Units(
        result
            .token_ids()
            .iter()
            .enumerate()
            .map(|(index, &token_id)| TokenUnit {
                index,
                token_id,
                label: token_id.to_string(),
                palette_slot: None,
            })
            .collect(),
    )
}

pub fn text_view(result: &EncodeResult) -> TokenPane {
    if result.is_empty() {
        return TokenPane::Empty;
    }
    TokenPane::Units(
        result
            .iter()
            .enumerate()
            .map(|(index, (token_id, text))| TokenUnit {
                index,
                token_id,
                label: visible_token_text(text),
                palette_slot: Some(index % PALETTE_SIZE),
            })
            .collect(),
    )
}

/// Make whitespace-only and control characters show up as a visible cell.
pub fn visible_token_text(text: &str) -> String {
    let visible: String = text
        .chars()
        .map(|c| match c {
            '\n' => '↵',
            '\r' => '␍',
            '\t' => '→',
            c if c.is_control() => '�',
            c => c,
        })
        .collect();

    if visible.width() == 0 {
        "∅".to_string()
    } else {
        visible
    }
}

/// Counters shown next to the token views after a successful encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeStats {
    pub char_count: usize,
    pub token_count: usize,
}

impl EncodeStats {
    pub fn ratio_label(&self) -> String {
        compression_ratio(self.char_count, self.token_count)
    }
}

/// Characters per token to two decimals, "N/A" when there are no tokens.
pub fn compression_ratio(char_count: usize, token_count: usize) -> String {
    if token_count == 0 {
        return "N/A".to_string();
    }
    format!("{:.2}", char_count as f64 / token_count as f64)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DecodeView {
    #[default]
    Idle,
    Loading,
    Text { text: String, emphasized: bool },
    NoOutput,
}

impl DecodeView {
    pub fn from_decoded(text: String) -> Self {
        if text.trim().is_empty() {
            return DecodeView::NoOutput;
        }
        let emphasized = text.chars().count() < SHORT_DECODE_CHARS;
        DecodeView::Text { text, emphasized }
    }
}

/// Where a unit lands in a wrapped flow of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPlacement {
    pub unit: usize,
    pub row: u16,
    pub col: u16,
    pub width: u16,
}

/// Cell padding and spacing for a view's flow layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStyle {
    pub padding: u16,
    pub gap: u16,
}

impl FlowStyle {
    pub fn for_mode(mode: DisplayMode) -> Self {
        match mode {
            // IDs are boxed chips; text flows like prose.
            DisplayMode::Ids => FlowStyle { padding: 1, gap: 1 },
            DisplayMode::Text => FlowStyle { padding: 0, gap: 0 },
        }
    }
}

/// Lay units out left to right, wrapping at `width` columns.
///
/// Units that would land past row `u16::MAX` are not placed.
pub fn flow_layout(units: &[TokenUnit], width: u16, style: FlowStyle) -> Vec<UnitPlacement> {
    let mut placements = Vec::with_capacity(units.len());
    if width == 0 {
        return placements;
    }

    let mut row = 0u16;
    let mut col = 0u16;
    for (unit, token) in units.iter().enumerate() {
        let natural = u16::try_from(token.label.width())
            .unwrap_or(u16::MAX)
            .saturating_add(style.padding * 2);
        let cell = natural.clamp(1, width);

        if col > 0 && col.saturating_add(cell) > width {
            let Some(next) = row.checked_add(1) else {
                break;
            };
            row = next;
            col = 0;
        }

        placements.push(UnitPlacement {
            unit,
            row,
            col,
            width: cell,
        });

        col = col.saturating_add(cell.saturating_add(style.gap));
    }
    placements
}

pub fn row_count(placements: &[UnitPlacement]) -> u32 {
    placements.last().map(|p| u32::from(p.row) + 1).unwrap_or(0)
}

/// First visible row so that `selected` stays on screen.
pub fn scroll_offset(placements: &[UnitPlacement], selected: Option<usize>, height: u16) -> u16 {
    let Some(selected) = selected.and_then(|i| placements.get(i)) else {
        return 0;
    };
    if height == 0 {
        return selected.row;
    }
    selected.row.saturating_sub(height - 1)
}

/// Unit under a position relative to the flow origin.
pub fn unit_at(placements: &[UnitPlacement], row: u16, col: u16) -> Option<usize> {
    placements
        .iter()
        .find(|p| p.row == row && col >= p.col && col < p.col.saturating_add(p.width))
        .map(|p| p.unit)
}
