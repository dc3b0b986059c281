use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::editor::CategoryEditor;
use crate::tui::app::{App, Mode, PromptState};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Help overlay intercepts everything but its own toggle
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,

        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, -1),
        KeyCode::PageDown => move_cursor(app, 10),
        KeyCode::PageUp => move_cursor(app, -10),
        KeyCode::Char('g') | KeyCode::Home => app.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.cursor = app.visible.len().saturating_sub(1);
        }

        KeyCode::Char('/') => {
            app.mode = Mode::Search;
            app.status = None;
        }
        // Esc drops an applied filter
        KeyCode::Esc => {
            if !app.search_input.is_empty() {
                app.search_input.clear();
                app.refresh_visible();
            }
            app.status = None;
        }

        KeyCode::Char('d') => open_delete(app),
        KeyCode::Char('a') => {
            let parent = app.selected_id();
            let title = match app.selected_record() {
                Some(record) => format!("New category under {}", record.name),
                None => "New category".to_string(),
            };
            open_prompt(app, CategoryEditor::create(parent), title);
        }
        KeyCode::Char('A') => {
            open_prompt(app, CategoryEditor::create(None), "New top-level category".into());
        }
        KeyCode::Char('r') => {
            let Some(id) = app.selected_id() else {
                return;
            };
            let Some(editor) = CategoryEditor::edit(app.tree(), &id) else {
                return;
            };
            let title = format!("Rename {}", editor.draft.name);
            open_prompt(app, editor, title);
        }
        KeyCode::Char('R') => app.reload(),
        KeyCode::Char('e') => app.toggle_include_empty(),
        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let len = app.visible.len();
    if len == 0 {
        return;
    }
    let next = app.cursor.saturating_add_signed(delta);
    app.cursor = next.min(len - 1);
}

fn open_delete(app: &mut App) {
    let Some(id) = app.selected_id() else {
        return;
    };
    match app.delete.request(app.session.tree(), &id) {
        Ok(()) => {
            app.picking_target = None;
            app.mode = Mode::Delete;
            app.status = None;
        }
        Err(e) => app.set_error(e.to_string()),
    }
}

fn open_prompt(app: &mut App, editor: CategoryEditor, title: String) {
    let cursor = editor.draft.name.len();
    app.prompt = Some(PromptState {
        editor,
        title,
        cursor,
    });
    app.mode = Mode::Prompt;
    app.status = None;
}
