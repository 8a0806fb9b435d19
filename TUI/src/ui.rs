use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, CopiedToken};
use crate::config::KEY_HINTS;
use crate::render::{
    self, DecodeView, FlowStyle, TokenPane, UnitPlacement, EMPTY_TOKENS_PLACEHOLDER,
    NO_OUTPUT_PLACEHOLDER,
};
use crate::theme::{palette, Palette};
use crate::ui_state::{DisplayMode, Focus};

const ENCODE_HINT: &str = "Try typing something like \"Hello, world!\"";
const ENCODE_PLACEHOLDER: &str = "Enter text to tokenize...";
const DECODE_HINT: &str = "Try entering numbers like: 15496, 11, 995";
const DECODE_PLACEHOLDER: &str = "Enter token IDs (comma-separated integers)...";

const COPY_TO_DECODE_LABEL: &str = "[ Copy to Decode ]";
const COPIED_LABEL: &str = "[ Copied! ]";
const TEXT_LABEL: &str = " Text ";
const IDS_LABEL: &str = " IDs ";
const BUTTON_WIDTH: u16 = 15; // "[ Encoding... ]"

/// Clickable regions of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotspot {
    EncodeInput,
    EncodeButton,
    ShowText,
    ShowIds,
    CopyToDecode,
    TokenPane,
    DecodeInput,
    DecodeButton,
}

/// Every region the painter draws into. Built from the frame size alone, so
/// mouse handling can rebuild it without a frame.
#[derive(Debug, Clone, Copy)]
pub struct ScreenLayout {
    pub header: Rect,
    pub encode_input: Rect,
    pub encode_bar: Rect,
    pub encode_button: Rect,
    pub tokens_bar: Rect,
    pub show_text: Rect,
    pub show_ids: Rect,
    pub copy_to_decode: Rect,
    pub tokens_pane: Rect,
    pub decode_input: Rect,
    pub decode_bar: Rect,
    pub decode_button: Rect,
    pub decoded: Rect,
    pub footer: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect) -> Self {
        let padded = Rect {
            x: area.x + 1,
            y: area.y,
            width: area.width.saturating_sub(2),
            height: area.height,
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(5), // Encode input
                Constraint::Length(1), // Encode button + char count
                Constraint::Length(1), // View labels + stats
                Constraint::Min(4),    // Tokens
                Constraint::Length(3), // Decode input
                Constraint::Length(1), // Decode button
                Constraint::Length(5), // Decoded text
                Constraint::Length(1), // Footer
            ])
            .split(padded);

        let tokens_bar = rows[3];
        let copy_width = COPY_TO_DECODE_LABEL.len() as u16;

        Self {
            header: rows[0],
            encode_input: rows[1],
            encode_bar: rows[2],
            encode_button: clip(rows[2].x, rows[2], BUTTON_WIDTH),
            tokens_bar,
            show_text: clip(tokens_bar.x + 8, tokens_bar, TEXT_LABEL.len() as u16),
            show_ids: clip(
                tokens_bar.x + 8 + TEXT_LABEL.len() as u16 + 1,
                tokens_bar,
                IDS_LABEL.len() as u16,
            ),
            copy_to_decode: clip(
                (tokens_bar.x + tokens_bar.width).saturating_sub(copy_width),
                tokens_bar,
                copy_width,
            ),
            tokens_pane: rows[4],
            decode_input: rows[5],
            decode_bar: rows[6],
            decode_button: clip(rows[6].x, rows[6], BUTTON_WIDTH),
            decoded: rows[7],
            footer: rows[8],
        }
    }

    pub fn hit(&self, column: u16, row: u16) -> Option<Hotspot> {
        let pos = Position::new(column, row);
        [
            (self.encode_button, Hotspot::EncodeButton),
            (self.decode_button, Hotspot::DecodeButton),
            (self.show_text, Hotspot::ShowText),
            (self.show_ids, Hotspot::ShowIds),
            (self.copy_to_decode, Hotspot::CopyToDecode),
            (self.encode_input, Hotspot::EncodeInput),
            (self.decode_input, Hotspot::DecodeInput),
            (self.tokens_pane, Hotspot::TokenPane),
        ]
        .into_iter()
        .find(|(rect, _)| rect.contains(pos))
        .map(|(_, spot)| spot)
    }
}

/// A `width`-wide slice of `bar` starting at `x`, kept inside the bar.
fn clip(x: u16, bar: Rect, width: u16) -> Rect {
    let right = bar.x.saturating_add(bar.width);
    let x = x.clamp(bar.x, right);
    Rect {
        x,
        y: bar.y,
        width: width.min(right.saturating_sub(x)),
        height: bar.height,
    }
}

fn panel(title: &str, border: ratatui::style::Color, p: &Palette) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(p.panel))
}

/// Placement of the visible token view inside the pane.
struct TokenFlow {
    inner: Rect,
    placements: Vec<UnitPlacement>,
    offset: u16,
}

fn token_flow(app: &App, pane: Rect) -> TokenFlow {
    let inner = Block::default().borders(Borders::ALL).inner(pane);
    let mode = app.ui.display_mode();
    let units = app.token_views.pane(mode).units();
    let placements = render::flow_layout(units, inner.width, FlowStyle::for_mode(mode));
    let offset = render::scroll_offset(&placements, app.selected_token, inner.height);
    TokenFlow {
        inner,
        placements,
        offset,
    }
}

/// Token unit under a screen position, if any.
pub fn token_at(app: &App, layout: &ScreenLayout, column: u16, row: u16) -> Option<usize> {
    let flow = token_flow(app, layout.tokens_pane);
    if !flow.inner.contains(Position::new(column, row)) {
        return None;
    }
    render::unit_at(
        &flow.placements,
        row - flow.inner.y + flow.offset,
        column - flow.inner.x,
    )
}

pub fn draw(frame: &mut Frame, app: &App) {
    let p = palette(app.ui.theme());
    let bg = Block::default().style(Style::default().bg(p.background));
    frame.render_widget(bg, frame.area());

    let layout = ScreenLayout::new(frame.area());

    draw_header(frame, app, p, layout.header);
    draw_input(
        frame,
        app,
        p,
        layout.encode_input,
        Focus::EncodeInput,
        "Text to Encode",
    );
    draw_encode_bar(frame, app, p, &layout);
    draw_tokens_bar(frame, app, p, &layout);
    draw_tokens(frame, app, p, layout.tokens_pane);
    draw_input(
        frame,
        app,
        p,
        layout.decode_input,
        Focus::DecodeInput,
        "Token IDs to Decode",
    );
    draw_decode_bar(frame, app, p, &layout);
    draw_decoded(frame, app, p, layout.decoded);
    draw_footer(frame, app, p, layout.footer);

    if app.current_error().is_some() {
        draw_error_popup(frame, app, p);
    }
}

fn draw_header(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let line = Line::from(vec![
        Span::styled("Tokenizer", Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
        Span::styled("  ·  ", Style::default().fg(p.text_muted)),
        Span::styled(app.api_base_url().to_string(), Style::default().fg(p.text_secondary)),
        Span::styled("  ·  ", Style::default().fg(p.text_muted)),
        Span::styled(
            format!("{} theme", app.ui.theme().name()),
            Style::default().fg(p.accent_warm),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_input(frame: &mut Frame, app: &App, p: &Palette, area: Rect, field: Focus, title: &str) {
    let focused = app.ui.focus == field;
    let border = if app.is_flagged(field) {
        p.error
    } else if focused {
        p.border_focus
    } else {
        p.border
    };

    let block = panel(title, border, p);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (value, hint, placeholder) = match field {
        Focus::DecodeInput => (&app.ui.decode_input, DECODE_HINT, DECODE_PLACEHOLDER),
        _ => (&app.ui.encode_input, ENCODE_HINT, ENCODE_PLACEHOLDER),
    };

    let paragraph = if value.is_empty() {
        let text = if focused { hint } else { placeholder };
        Paragraph::new(Span::styled(
            text,
            Style::default().fg(p.text_muted).add_modifier(Modifier::ITALIC),
        ))
    } else {
        let cursor = if focused && app.animation_tick % 60 < 30 { "▏" } else { "" };
        let mut lines: Vec<Line> = value.split('\n').map(|l| Line::from(l.to_string())).collect();
        if let Some(last) = lines.last_mut() {
            last.push_span(Span::styled(cursor, Style::default().fg(p.accent)));
        }
        Paragraph::new(lines)
            .style(Style::default().fg(p.text_primary))
            .wrap(Wrap { trim: false })
    };

    // Keep the tail of long input visible.
    let overflow = value.lines().count().saturating_sub(inner.height as usize) as u16;
    frame.render_widget(paragraph.scroll((overflow, 0)), inner);
}

fn button<'a>(label: &'a str, enabled: bool, flash: bool, p: &Palette) -> Span<'a> {
    let style = if !enabled {
        Style::default().fg(p.text_muted)
    } else if flash {
        Style::default().fg(p.background).bg(p.success).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(p.background).bg(p.accent).add_modifier(Modifier::BOLD)
    };
    Span::styled(format!("[ {} ]", label), style)
}

fn draw_encode_bar(frame: &mut Frame, app: &App, p: &Palette, layout: &ScreenLayout) {
    let encode = button(app.encode.label(), app.encode.trigger_enabled(), false, p);
    frame.render_widget(Paragraph::new(encode), layout.encode_button);

    let count = app.ui.encode_input.chars().count();
    let chars = Paragraph::new(Span::styled(
        format!("{} chars", count),
        Style::default().fg(p.text_muted),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(chars, layout.encode_bar);
}

fn draw_tokens_bar(frame: &mut Frame, app: &App, p: &Palette, layout: &ScreenLayout) {
    let bar = layout.tokens_bar;
    frame.render_widget(
        Paragraph::new(Span::styled("Tokens:", Style::default().fg(p.text_secondary))),
        bar,
    );

    let mode = app.ui.display_mode();
    let label = |text: &'static str, active: bool| {
        let style = if active {
            Style::default().fg(p.background).bg(p.accent_warm).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(p.text_muted)
        };
        Paragraph::new(Span::styled(text, style))
    };
    frame.render_widget(label(TEXT_LABEL, mode == DisplayMode::Text), layout.show_text);
    frame.render_widget(label(IDS_LABEL, mode == DisplayMode::Ids), layout.show_ids);

    // Stats sit between the labels and the copy button.
    if let Some(stats) = &app.stats {
        let stats_x = layout.show_ids.x + layout.show_ids.width + 2;
        let stats_area = Rect {
            x: stats_x,
            y: bar.y,
            width: layout.copy_to_decode.x.saturating_sub(stats_x + 1),
            height: 1,
        };
        let mut spans = vec![
            Span::styled("Tokens ", Style::default().fg(p.text_muted)),
            Span::styled(stats.token_count.to_string(), Style::default().fg(p.text_primary)),
            Span::styled("  Chars ", Style::default().fg(p.text_muted)),
            Span::styled(stats.char_count.to_string(), Style::default().fg(p.text_primary)),
            Span::styled("  Ratio ", Style::default().fg(p.text_muted)),
            Span::styled(stats.ratio_label(), Style::default().fg(p.accent)),
        ];
        if let Some(at) = app.encoded_at {
            spans.push(Span::styled(
                format!("  @ {}", at.format("%H:%M:%S")),
                Style::default().fg(p.text_muted),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), stats_area);
    }

    let copy = if app.copy_to_decode_ack.is_some() {
        Span::styled(
            format!("{:>width$}", COPIED_LABEL, width = COPY_TO_DECODE_LABEL.len()),
            Style::default().fg(p.success).add_modifier(Modifier::BOLD),
        )
    } else if app.can_copy_to_decode() {
        Span::styled(COPY_TO_DECODE_LABEL, Style::default().fg(p.accent))
    } else {
        Span::styled(COPY_TO_DECODE_LABEL, Style::default().fg(p.text_muted))
    };
    frame.render_widget(Paragraph::new(copy), layout.copy_to_decode);
}

fn draw_tokens(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let border = if app.ui.focus == Focus::TokenPane {
        p.border_focus
    } else {
        p.border
    };
    let title = match app.ui.display_mode() {
        DisplayMode::Ids => "Token IDs",
        DisplayMode::Text => "Tokens",
    };
    let mode = app.ui.display_mode();
    let flow = token_flow(app, area);

    let mut block = panel(title, border, p);
    let rows = render::row_count(&flow.placements);
    if rows > u32::from(flow.inner.height) {
        let first = u32::from(flow.offset) + 1;
        let last = (u32::from(flow.offset) + u32::from(flow.inner.height)).min(rows);
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" rows {}-{} of {} ", first, last, rows),
                Style::default().fg(p.text_muted),
            ))
            .right_aligned(),
        );
    }
    frame.render_widget(block, area);
    let placeholder = |text: &str| {
        Paragraph::new(Span::styled(
            text.to_string(),
            Style::default().fg(p.text_muted).add_modifier(Modifier::ITALIC),
        ))
    };

    let units = match app.token_views.pane(mode) {
        TokenPane::Idle => return,
        TokenPane::Loading(text) => {
            frame.render_widget(placeholder(*text), flow.inner);
            return;
        }
        TokenPane::Empty => {
            frame.render_widget(placeholder(EMPTY_TOKENS_PLACEHOLDER), flow.inner);
            return;
        }
        TokenPane::Units(units) => units,
    };

    let style = FlowStyle::for_mode(mode);
    let copied = app.copied_token.as_ref().map(|t| t.value);

    for placement in &flow.placements {
        if placement.row < flow.offset || placement.row - flow.offset >= flow.inner.height {
            continue;
        }
        let unit = &units[placement.unit];

        let mut cell_style = match unit.palette_slot {
            Some(slot) => Style::default().fg(p.token_fg).bg(p.token(slot)),
            None => Style::default().fg(p.text_primary).bg(p.border),
        };
        if app.selected_token == Some(placement.unit) {
            cell_style = cell_style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
        }
        if copied == Some(CopiedToken { view: mode, unit: placement.unit }) {
            cell_style = Style::default().fg(p.background).bg(p.success).add_modifier(Modifier::BOLD);
        }

        let pad = " ".repeat(style.padding as usize);
        let cell = Rect {
            x: flow.inner.x + placement.col,
            y: flow.inner.y + placement.row - flow.offset,
            width: placement.width,
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!("{pad}{}{pad}", unit.label), cell_style)),
            cell,
        );
    }
}

fn draw_decode_bar(frame: &mut Frame, app: &App, p: &Palette, layout: &ScreenLayout) {
    let flash = app.decode_flash.is_some();
    let decode = button(app.decode.label(), app.decode.trigger_enabled(), flash, p);
    frame.render_widget(Paragraph::new(decode), layout.decode_button);
}

fn draw_decoded(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let block = panel("Decoded Text", p.border, p);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let muted = Style::default().fg(p.text_muted).add_modifier(Modifier::ITALIC);
    let paragraph = match &app.decode_view {
        DecodeView::Idle => return,
        DecodeView::Loading => Paragraph::new(Span::styled(
            app.decode_placeholder().unwrap_or_default(),
            muted,
        )),
        DecodeView::NoOutput => Paragraph::new(Span::styled(NO_OUTPUT_PLACEHOLDER, muted)),
        DecodeView::Text { text, emphasized } => {
            let mut style = Style::default().fg(p.text_primary);
            if *emphasized {
                style = style.add_modifier(Modifier::BOLD);
            }
            Paragraph::new(text.as_str()).style(style).wrap(Wrap { trim: false })
        }
    };
    frame.render_widget(paragraph, inner);
}

fn draw_footer(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let line = match &app.status_message {
        Some(status) => Line::from(Span::styled(
            status.value.clone(),
            Style::default().fg(p.success).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(
            KEY_HINTS
                .iter()
                .flat_map(|(key, what)| {
                    [
                        Span::styled(*key, Style::default().fg(p.accent).add_modifier(Modifier::BOLD)),
                        Span::styled(format!(" {}  ", what), Style::default().fg(p.text_muted)),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_error_popup(frame: &mut Frame, app: &App, p: &Palette) {
    let Some(error) = app.current_error() else {
        return;
    };
    let title = match app.queued_errors() {
        0 | 1 => format!(" {} Error ", error.operation.idle_label()),
        n => format!(" {} Error (1 of {}) ", error.operation.idle_label(), n),
    };
    let area = frame.area();
    let width = 60.min(area.width.saturating_sub(4));
    let height = 7.min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(p.error).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(p.error))
        .style(Style::default().bg(p.panel));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let text = vec![
        Line::from(Span::styled(error.message.clone(), Style::default().fg(p.text_primary))),
        Line::from(""),
        Line::from(Span::styled(
            "Enter / Esc / click to dismiss",
            Style::default().fg(p.text_muted),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: true }).alignment(Alignment::Center),
        inner,
    );
}
