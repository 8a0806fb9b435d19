use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::action::Action;
use crate::backend::{BackendError, EncodeResult, TokenizerApi};
use crate::clipboard::ClipboardSink;
use crate::config::Config;
use crate::preferences::{PreferenceStore, Preferences};
use crate::render::{DecodeView, EncodeStats, TokenViews, DECODE_LOADING_PLACEHOLDER};
use crate::request::{self, Operation, OperationState, RequestPhase};
use crate::ui_state::{DisplayMode, Focus, Theme, UIState};

/// Result of a spawned request, delivered back to the UI thread.
#[derive(Debug)]
pub enum Outcome {
    Encoded {
        result: Result<EncodeResult, BackendError>,
        char_count: usize,
    },
    Decoded(Result<String, BackendError>),
}

/// Modal error message. Blocks other input until dismissed.
/// Failures arriving together queue up and are shown one at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPopup {
    pub operation: Operation,
    pub message: String,
}

/// A value that disappears after a number of ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Transient<T> {
    pub value: T,
    ticks_left: u64,
}

impl<T> Transient<T> {
    pub fn new(value: T, ticks: u64) -> Self {
        Self {
            value,
            ticks_left: ticks,
        }
    }

    /// Returns false once expired.
    fn tick(&mut self) -> bool {
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left > 0
    }
}

fn tick_transient<T>(slot: &mut Option<Transient<T>>) {
    if let Some(t) = slot {
        if !t.tick() {
            *slot = None;
        }
    }
}

/// Which token cell was just copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedToken {
    pub view: DisplayMode,
    pub unit: usize,
}

pub struct App {
    pub ui: UIState,
    pub config: Config,
    pub encode: OperationState,
    pub decode: OperationState,
    pub token_views: TokenViews,
    pub decode_view: DecodeView,
    pub stats: Option<EncodeStats>,
    pub encoded_at: Option<DateTime<Local>>,
    pub selected_token: Option<usize>,
    pub encode_flag: Option<Transient<()>>,
    pub decode_flag: Option<Transient<()>>,
    pub status_message: Option<Transient<String>>,
    pub copied_token: Option<Transient<CopiedToken>>,
    pub copy_to_decode_ack: Option<Transient<()>>,
    pub decode_flash: Option<Transient<()>>,
    pub animation_tick: u64,
    pub should_quit: bool,
    errors: VecDeque<ErrorPopup>,
    api: Arc<dyn TokenizerApi>,
    runtime: Handle,
    outcomes_tx: UnboundedSender<Outcome>,
    outcomes_rx: UnboundedReceiver<Outcome>,
    clipboard: Box<dyn ClipboardSink>,
    prefs: PreferenceStore,
}

impl App {
    pub fn new(
        config: Config,
        api: Arc<dyn TokenizerApi>,
        runtime: Handle,
        clipboard: Box<dyn ClipboardSink>,
        prefs: PreferenceStore,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        let mut ui = UIState::new();
        match prefs.load() {
            Ok(saved) => ui.set_theme(saved.theme),
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable preferences"),
        }

        Self {
            ui,
            config,
            encode: OperationState::new(Operation::Encode),
            decode: OperationState::new(Operation::Decode),
            token_views: TokenViews::idle(),
            decode_view: DecodeView::Idle,
            stats: None,
            encoded_at: None,
            selected_token: None,
            encode_flag: None,
            decode_flag: None,
            status_message: None,
            copied_token: None,
            copy_to_decode_ack: None,
            decode_flash: None,
            animation_tick: 0,
            should_quit: false,
            errors: VecDeque::new(),
            api,
            runtime,
            outcomes_tx,
            outcomes_rx,
            clipboard,
            prefs,
        }
    }

    pub fn handle(&mut self, action: Action) {
        // The error popup is modal.
        if !self.errors.is_empty() && !matches!(action, Action::DismissError | Action::Quit) {
            return;
        }

        match action {
            Action::Encode => self.submit_encode(),
            Action::Decode => self.submit_decode(),
            Action::ToggleDisplayMode => self.toggle_display_mode(),
            Action::ShowDisplayMode(mode) => self.set_display_mode(mode),
            Action::ToggleTheme => self.toggle_theme(),
            Action::CopyToDecode => {
                self.copy_to_decode();
            }
            Action::CopyToken { view, unit } => self.copy_token(view, unit),
            Action::CopySelectedToken => {
                if let Some(unit) = self.selected_token {
                    self.copy_token(self.ui.display_mode(), unit);
                }
            }
            Action::SelectNextToken => self.select_token(1),
            Action::SelectPreviousToken => self.select_token(-1),
            Action::FocusNext => self.ui.focus = self.ui.focus.next(),
            Action::FocusPrevious => self.ui.focus = self.ui.focus.previous(),
            Action::Focus(focus) => self.ui.focus = focus,
            Action::InsertChar(c) => {
                if let Some(input) = self.ui.focused_input_mut() {
                    input.push(c);
                }
            }
            Action::Backspace => {
                if let Some(input) = self.ui.focused_input_mut() {
                    input.pop();
                }
            }
            Action::ClearInput => {
                if let Some(input) = self.ui.focused_input_mut() {
                    input.clear();
                }
            }
            Action::Paste(text) => self.paste(&text),
            Action::PasteFromClipboard => match self.clipboard.get_text() {
                Ok(text) => self.paste(&text),
                Err(e) => self.set_status(e.to_string()),
            },
            Action::DismissError => {
                self.errors.pop_front();
            }
            Action::Quit => self.should_quit = true,
        }
    }

    pub fn tick(&mut self) {
        self.animation_tick += 1;

        tick_transient(&mut self.encode_flag);
        tick_transient(&mut self.decode_flag);
        tick_transient(&mut self.status_message);
        tick_transient(&mut self.copied_token);
        tick_transient(&mut self.copy_to_decode_ack);
        tick_transient(&mut self.decode_flash);
    }

    /// Apply every outcome that has arrived since the last call. Never waits.
    pub fn poll_outcomes(&mut self) {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    pub fn submit_encode(&mut self) {
        if self.encode.is_in_flight() {
            tracing::debug!("encode already in flight; ignoring");
            return;
        }

        let text = self.ui.encode_input.clone();
        if let Err(e) = request::validate_encode_input(&text) {
            self.show_error(Operation::Encode, e);
            return;
        }

        self.encode.begin();
        self.token_views = TokenViews::loading();
        self.selected_token = None;
        self.copied_token = None;

        let char_count = text.chars().count();
        tracing::info!(chars = char_count, "encode requested");

        let api = Arc::clone(&self.api);
        let tx = self.outcomes_tx.clone();
        self.runtime.spawn(async move {
            let result = api.encode(&text).await;
            let _ = tx.send(Outcome::Encoded { result, char_count });
        });
    }

    pub fn submit_decode(&mut self) {
        if self.decode.is_in_flight() {
            tracing::debug!("decode already in flight; ignoring");
            return;
        }

        let tokens = match request::parse_token_list(&self.ui.decode_input) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.show_error(Operation::Decode, e);
                return;
            }
        };

        self.decode.begin();
        self.decode_view = DecodeView::Loading;
        tracing::info!(tokens = tokens.len(), "decode requested");

        let api = Arc::clone(&self.api);
        let tx = self.outcomes_tx.clone();
        self.runtime.spawn(async move {
            let result = api.decode(&tokens).await;
            let _ = tx.send(Outcome::Decoded(result));
        });
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Encoded {
                result: Ok(result),
                char_count,
            } => {
                tracing::info!(tokens = result.len(), "encode succeeded");
                self.encode.finish(true);
                self.stats = Some(EncodeStats {
                    char_count,
                    token_count: result.len(),
                });
                self.encoded_at = Some(Local::now());
                // Both views are rebuilt before the result is recorded, so a
                // later display-mode toggle never has stale data to show.
                self.token_views = TokenViews::from_result(&result);
                self.ui.record_encode_result(result);
            }
            Outcome::Encoded { result: Err(e), .. } => {
                self.encode.finish(false);
                self.token_views = TokenViews::idle();
                self.stats = None;
                self.show_error(Operation::Encode, e);
            }
            Outcome::Decoded(Ok(text)) => {
                tracing::info!(chars = text.chars().count(), "decode succeeded");
                self.decode.finish(true);
                self.decode_view = DecodeView::from_decoded(text);
                self.decode_flash = Some(Transient::new((), self.config.ticks(self.config.decode_flash_ms)));
            }
            Outcome::Decoded(Err(e)) => {
                self.decode.finish(false);
                self.decode_view = DecodeView::Idle;
                self.show_error(Operation::Decode, e);
            }
        }
    }

    fn show_error(&mut self, operation: Operation, error: BackendError) {
        tracing::warn!(?operation, error = %error, "request failed");

        let flag = Some(Transient::new((), self.config.ticks(self.config.error_flag_ms)));
        match operation {
            Operation::Encode => self.encode_flag = flag,
            Operation::Decode => self.decode_flag = flag,
        }
        self.errors.push_back(ErrorPopup {
            operation,
            message: request::user_message(operation, &error, self.api.base_url()),
        });
    }

    /// The popup currently shown, if any.
    pub fn current_error(&self) -> Option<&ErrorPopup> {
        self.errors.front()
    }

    pub fn queued_errors(&self) -> usize {
        self.errors.len()
    }

    pub fn is_flagged(&self, field: Focus) -> bool {
        match field {
            Focus::EncodeInput => self.encode_flag.is_some(),
            Focus::DecodeInput => self.decode_flag.is_some(),
            Focus::TokenPane => false,
        }
    }

    /// Enabled only while the panes show a non-empty successful result.
    pub fn can_copy_to_decode(&self) -> bool {
        !matches!(self.encode.phase(), RequestPhase::InFlight | RequestPhase::Failed)
            && self
                .ui
                .last_encode_result()
                .is_some_and(|result| !result.is_empty())
    }

    /// Fill the decode input from the last encode result. Does not decode.
    pub fn copy_to_decode(&mut self) -> bool {
        if !self.can_copy_to_decode() {
            return false;
        }
        let Some(result) = self.ui.last_encode_result() else {
            return false;
        };

        self.ui.decode_input = request::format_token_list(result.token_ids());
        self.ui.focus = Focus::DecodeInput;
        self.copy_to_decode_ack = Some(Transient::new((), self.config.ticks(self.config.copy_to_decode_ack_ms)));
        true
    }

    pub fn copy_token(&mut self, view: DisplayMode, unit: usize) {
        let Some(token) = self.token_views.pane(view).units().get(unit) else {
            return;
        };
        let token_id = token.token_id;
        self.selected_token = Some(unit);

        match self.clipboard.set_text(&token_id.to_string()) {
            Ok(()) => {
                let ack_ms = match view {
                    DisplayMode::Ids => self.config.id_copy_ack_ms,
                    DisplayMode::Text => self.config.text_copy_ack_ms,
                };
                let ticks = self.config.ticks(ack_ms);
                self.copied_token = Some(Transient::new(CopiedToken { view, unit }, ticks));
                self.status_message = Some(Transient::new(format!("Copied ID: {}", token_id), ticks));
            }
            Err(e) => {
                tracing::warn!(error = %e, "clipboard write failed");
                self.set_status(e.to_string());
            }
        }
    }

    fn select_token(&mut self, delta: isize) {
        let count = self.token_views.pane(self.ui.display_mode()).units().len();
        if count == 0 {
            self.selected_token = None;
            return;
        }
        self.selected_token = Some(match self.selected_token {
            None if delta < 0 => count - 1,
            None => 0,
            Some(i) => (i as isize + delta).rem_euclid(count as isize) as usize,
        });
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.ui.set_display_mode(mode);
    }

    pub fn toggle_display_mode(&mut self) {
        self.set_display_mode(self.ui.display_mode().toggled());
    }

    pub fn toggle_theme(&mut self) {
        let theme = self.ui.theme().toggled();
        self.set_theme(theme);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.ui.set_theme(theme);
        tracing::info!(theme = theme.name(), path = %self.prefs.path().display(), "theme changed");
        if let Err(e) = self.prefs.save(&Preferences { theme }) {
            tracing::warn!(error = %e, "could not persist theme");
            self.set_status(format!("Theme not saved: {}", e));
        }
    }

    fn paste(&mut self, text: &str) {
        let focus = self.ui.focus;
        let Some(input) = self.ui.focused_input_mut() else {
            return;
        };
        let filtered = text.chars().filter(|c| *c != '\r').map(|c| {
            // Token lists are single-line; text to encode keeps its newlines.
            if c == '\n' && focus == Focus::DecodeInput {
                ' '
            } else {
                c
            }
        });
        input.extend(filtered);
    }

    fn set_status(&mut self, message: String) {
        self.status_message = Some(Transient::new(message, self.config.ticks(self.config.status_timeout_ms)));
    }

    pub fn decode_placeholder(&self) -> Option<&'static str> {
        match self.decode_view {
            DecodeView::Loading => Some(DECODE_LOADING_PLACEHOLDER),
            _ => None,
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Wait for the next outcome and apply it.
    #[cfg(test)]
    async fn settle(&mut self) {
        let outcome = self.outcomes_rx.recv().await.expect("channel open");
        self.apply_outcome(outcome);
    }
}
