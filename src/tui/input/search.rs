use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};

/// Live filter: the tree narrows on every keystroke
pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        // Cancel: drop the filter
        (_, KeyCode::Esc) => {
            app.search_input.clear();
            app.refresh_visible();
            app.mode = Mode::Navigate;
        }

        // Keep the filter and go back to the tree
        (_, KeyCode::Enter) => {
            app.mode = Mode::Navigate;
            if app.visible.is_empty() && !app.search_input.is_empty() {
                app.set_info(format!("no categories match '{}'", app.search_input.trim()));
            }
        }

        (_, KeyCode::Backspace) => {
            app.search_input.pop();
            app.refresh_visible();
        }

        // Cursor keys still move through the narrowed tree
        (_, KeyCode::Down) => {
            app.cursor = (app.cursor + 1).min(app.visible.len().saturating_sub(1));
        }
        (_, KeyCode::Up) => {
            app.cursor = app.cursor.saturating_sub(1);
        }

        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            app.search_input.push(c);
            app.refresh_visible();
        }

        _ => {}
    }
}
