use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use regex::Regex;

use crate::cli::handlers::Settings;
use crate::model::category::CategoryId;
use crate::model::tree::{CategoryRecord, CategoryTree};
use crate::model::UiConfig;
use crate::ops::delete::DeleteDialog;
use crate::ops::editor::CategoryEditor;
use crate::ops::search::{direct_matches, filter_tree};
use crate::ops::session::CategorySession;

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the live filter
    Search,
    /// One-line name prompt (add or rename)
    Prompt,
    /// Delete confirmation dialog
    Delete,
}

/// One-line prompt backed by a category form
#[derive(Debug, Clone)]
pub struct PromptState {
    pub editor: CategoryEditor,
    pub title: String,
    /// Byte offset into `editor.draft.name`
    pub cursor: usize,
}

/// Transient message in the status row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct App {
    pub session: CategorySession,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub show_key_hints: bool,
    /// Help overlay visible
    pub show_help: bool,
    /// The session tree narrowed by `search_input`
    pub visible: CategoryTree,
    /// Cursor into `visible`'s pre-order rows
    pub cursor: usize,
    /// First visible row
    pub scroll_offset: usize,
    /// Live filter query
    pub search_input: String,
    pub delete: DeleteDialog,
    /// Reassignment picker open, with its cursor
    pub picking_target: Option<usize>,
    pub prompt: Option<PromptState>,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(session: CategorySession, ui: &UiConfig) -> Self {
        let visible = session.tree().clone();
        App {
            session,
            mode: Mode::Navigate,
            should_quit: false,
            theme: Theme::from_config(ui),
            show_key_hints: ui.show_key_hints,
            show_help: false,
            visible,
            cursor: 0,
            scroll_offset: 0,
            search_input: String::new(),
            delete: DeleteDialog::new(),
            picking_target: None,
            prompt: None,
            status: None,
        }
    }

    pub fn tree(&self) -> &CategoryTree {
        self.session.tree()
    }

    /// Visible slot indices in display order
    pub fn rows(&self) -> Vec<usize> {
        self.visible.preorder().collect()
    }

    pub fn selected_id(&self) -> Option<CategoryId> {
        let idx = self.visible.preorder().nth(self.cursor)?;
        Some(self.visible.slot(idx).record.id.clone())
    }

    /// The selected category as it is in the full tree
    pub fn selected_record(&self) -> Option<&CategoryRecord> {
        let id = self.selected_id()?;
        self.tree().get(&id)
    }

    /// Case-insensitive regex for highlighting filter matches
    pub fn active_search_re(&self) -> Option<Regex> {
        let query = self.search_input.trim();
        if query.is_empty() {
            return None;
        }
        Regex::new(&format!("(?i){}", regex::escape(query))).ok()
    }

    /// Re-apply the filter to the session tree. The cursor stays on the
    /// same category if it is still shown, else lands on the first match.
    pub fn refresh_visible(&mut self) {
        let selected = self.selected_id();
        self.visible = filter_tree(self.session.tree(), &self.search_input);
        let position = |id: &CategoryId| {
            self.visible
                .preorder()
                .position(|idx| &self.visible.slot(idx).record.id == id)
        };
        self.cursor = selected
            .as_ref()
            .and_then(position)
            .or_else(|| {
                direct_matches(&self.visible, &self.search_input)
                    .first()
                    .copied()
                    .and_then(position)
            })
            .unwrap_or(0);
        self.clamp_cursor();
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.visible.len();
        if len == 0 {
            self.cursor = 0;
        } else {
            self.cursor = self.cursor.min(len - 1);
        }
    }

    /// Move the cursor onto `id` if it is visible
    pub fn select(&mut self, id: &CategoryId) {
        if let Some(pos) = self
            .visible
            .preorder()
            .position(|idx| &self.visible.slot(idx).record.id == id)
        {
            self.cursor = pos;
        }
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Fetch the tree again
    pub fn reload(&mut self) {
        match self.session.reload() {
            Ok(()) => {
                self.refresh_visible();
                self.set_info(format!("{} categories", self.tree().len()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "reload failed");
                self.set_error(e.user_message("Failed to load categories"));
            }
        }
    }

    /// Show or hide categories without components, then reload
    pub fn toggle_include_empty(&mut self) {
        let include_empty = !self.session.include_empty();
        self.session.set_include_empty(include_empty);
        self.reload();
        if self.status.as_ref().is_some_and(|s| !s.is_error) {
            let shown = if include_empty { "shown" } else { "hidden" };
            self.set_info(format!("empty categories {}", shown));
        }
    }

    /// Refresh the view after a mutation, noting a stale snapshot
    pub fn after_mutation(&mut self) {
        self.refresh_visible();
        if self.session.is_stale() {
            self.set_error("saved, but reloading failed; press R to retry");
        }
    }
}

/// Run the TUI application
pub fn run(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = CategorySession::new(settings.backend(), settings.config.tree.include_empty);
    let load_error = session.reload().err();

    let mut app = App::new(session, &settings.config.ui);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "initial load failed");
        app.set_error(e.user_message("Failed to load categories"));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::demo_app;

    #[test]
    fn test_new_app_shows_whole_tree() {
        let app = demo_app();
        assert_eq!(app.rows().len(), app.tree().len());
        assert_eq!(app.selected_record().unwrap().name, "Resistors");
    }

    #[test]
    fn test_refresh_keeps_selection_when_visible() {
        let mut app = demo_app();
        app.select(&CategoryId::from(6));
        app.search_input = "cer".into();
        app.refresh_visible();
        // Capacitors > Ceramic
        assert_eq!(app.rows().len(), 2);
        assert_eq!(app.selected_id(), Some(CategoryId::from(6)));

        app.search_input = "resist".into();
        app.refresh_visible();
        assert_eq!(app.cursor, 0);
        assert_eq!(app.selected_id(), Some(CategoryId::from(1)));
    }

    #[test]
    fn test_search_regex_escapes_query() {
        let mut app = demo_app();
        app.search_input = "op-amps (".into();
        let re = app.active_search_re().unwrap();
        assert!(re.is_match("OP-AMPS ("));
        app.search_input = "  ".into();
        assert!(app.active_search_re().is_none());
    }
}
