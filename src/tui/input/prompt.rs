use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::editor::{EditorError, EditorOutcome};
use crate::tui::app::{App, Mode};
use crate::util::unicode;

/// One-line name prompt. A failed save keeps the prompt and its text.
pub(super) fn handle_prompt(app: &mut App, key: KeyEvent) {
    let Some(prompt) = app.prompt.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };
    let name = &mut prompt.editor.draft.name;

    match (key.modifiers, key.code) {
        (_, KeyCode::Esc) => {
            app.prompt = None;
            app.mode = Mode::Navigate;
            app.status = None;
        }
        (_, KeyCode::Enter) => submit_prompt(app),

        (_, KeyCode::Left) => {
            if let Some(pos) = unicode::prev_grapheme_boundary(name, prompt.cursor) {
                prompt.cursor = pos;
            }
        }
        (_, KeyCode::Right) => {
            if let Some(pos) = unicode::next_grapheme_boundary(name, prompt.cursor) {
                prompt.cursor = pos;
            }
        }
        (_, KeyCode::Home) => prompt.cursor = 0,
        (_, KeyCode::End) => prompt.cursor = name.len(),
        (_, KeyCode::Backspace) => {
            if let Some(pos) = unicode::prev_grapheme_boundary(name, prompt.cursor) {
                name.replace_range(pos..prompt.cursor, "");
                prompt.cursor = pos;
            }
        }
        (_, KeyCode::Delete) => {
            if let Some(end) = unicode::next_grapheme_boundary(name, prompt.cursor) {
                name.replace_range(prompt.cursor..end, "");
            }
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            name.insert(prompt.cursor, c);
            prompt.cursor += c.len_utf8();
        }
        _ => {}
    }
}

fn submit_prompt(app: &mut App) {
    let Some(prompt) = app.prompt.as_mut() else {
        return;
    };
    match prompt.editor.submit(&mut app.session) {
        Ok(EditorOutcome::Saved(node)) => {
            let verb = if prompt.editor.editing().is_some() {
                "renamed"
            } else {
                "created"
            };
            app.prompt = None;
            app.mode = Mode::Navigate;
            app.after_mutation();
            app.select(&node.id);
            if !app.session.is_stale() {
                app.set_info(format!("{} {}", verb, node.name));
            }
        }
        Ok(EditorOutcome::Failed(message)) => app.set_error(message),
        Err(EditorError::Busy) => {}
        Err(EditorError::Invalid(e)) => app.set_error(e.to_string()),
    }
}
