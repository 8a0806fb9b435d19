mod action;
mod app;
mod backend;
mod clipboard;
mod config;
mod logging;
mod preferences;
mod probe;
mod render;
mod request;
mod theme;
mod ui;
mod ui_state;

use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event,
        KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use action::Action;
use app::App;
use backend::{HttpTokenizer, TokenizerApi};
use clipboard::SystemClipboard;
use config::{Cli, Config};
use preferences::PreferenceStore;
use ui::{draw, Hotspot, ScreenLayout};
use ui_state::{DisplayMode, Focus};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    logging::init(&config.log_file)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let api: Arc<dyn TokenizerApi> = Arc::new(
        HttpTokenizer::new(config.api_base_url.clone(), config.request_timeout())
            .context("Failed to build HTTP client")?,
    );
    tracing::info!(backend = api.base_url(), "starting tokenizer-tui");

    probe::spawn_probe(runtime.handle(), Arc::clone(&api), config.probe_timeout());

    let prefs = PreferenceStore::new(config.preferences_path());
    let mut app = App::new(
        config,
        api,
        runtime.handle().clone(),
        Box::new(SystemClipboard),
        prefs,
    );

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    runtime.shutdown_background();
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    let tick_rate = app.config.tick_rate();

    while !app.should_quit {
        app.tick();
        app.poll_outcomes();

        terminal.draw(|frame| draw(frame, app))?;

        if !event::poll(tick_rate)? {
            continue;
        }

        let action = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => key_action(app, key),
            Event::Paste(text) => Some(Action::Paste(text)),
            Event::Mouse(mouse) => {
                let size = terminal.size()?;
                mouse_action(app, Rect::new(0, 0, size.width, size.height), mouse)
            }
            _ => None,
        };

        if let Some(action) = action {
            app.handle(action);
        }
    }
    Ok(())
}

fn key_action(app: &App, key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if app.current_error().is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::DismissError),
            KeyCode::Char('c') if ctrl => Some(Action::Quit),
            _ => None,
        };
    }

    let focus = app.ui.focus;
    let action = match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('d') if ctrl => Action::CopyToDecode,
        KeyCode::Char('v') if ctrl => Action::PasteFromClipboard,
        KeyCode::Char('u') if ctrl => Action::ClearInput,
        KeyCode::Esc => Action::Quit,
        KeyCode::F(2) => Action::ToggleDisplayMode,
        KeyCode::F(3) => Action::ToggleTheme,
        KeyCode::F(4) => Action::CopyToDecode,
        KeyCode::Tab => Action::FocusNext,
        KeyCode::BackTab => Action::FocusPrevious,
        // Alt+Enter inserts a newline in the encode input.
        KeyCode::Enter if focus == Focus::EncodeInput && key.modifiers.contains(KeyModifiers::ALT) => {
            Action::InsertChar('\n')
        }
        KeyCode::Enter => match focus {
            Focus::EncodeInput => Action::Encode,
            Focus::DecodeInput => Action::Decode,
            Focus::TokenPane => Action::CopySelectedToken,
        },
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Left | KeyCode::Up if focus == Focus::TokenPane => Action::SelectPreviousToken,
        KeyCode::Right | KeyCode::Down if focus == Focus::TokenPane => Action::SelectNextToken,
        KeyCode::Char('t') if focus == Focus::TokenPane => Action::ShowDisplayMode(DisplayMode::Text),
        KeyCode::Char('i') if focus == Focus::TokenPane => Action::ShowDisplayMode(DisplayMode::Ids),
        KeyCode::Char('c') if focus == Focus::TokenPane => Action::CopySelectedToken,
        KeyCode::Char(c) if !ctrl => Action::InsertChar(c),
        _ => return None,
    };
    Some(action)
}

fn mouse_action(app: &App, area: Rect, mouse: MouseEvent) -> Option<Action> {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }
    if app.current_error().is_some() {
        return Some(Action::DismissError);
    }

    let layout = ScreenLayout::new(area);
    let action = match layout.hit(mouse.column, mouse.row)? {
        Hotspot::EncodeInput => Action::Focus(Focus::EncodeInput),
        Hotspot::DecodeInput => Action::Focus(Focus::DecodeInput),
        Hotspot::EncodeButton => Action::Encode,
        Hotspot::DecodeButton => Action::Decode,
        Hotspot::ShowText => Action::ShowDisplayMode(DisplayMode::Text),
        Hotspot::ShowIds => Action::ShowDisplayMode(DisplayMode::Ids),
        Hotspot::CopyToDecode => Action::CopyToDecode,
        Hotspot::TokenPane => match ui::token_at(app, &layout, mouse.column, mouse.row) {
            Some(unit) => Action::CopyToken {
                view: app.ui.display_mode(),
                unit,
            },
            None => Action::Focus(Focus::TokenPane),
        },
    };
    Some(action)
}
