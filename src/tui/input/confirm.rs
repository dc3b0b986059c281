use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::delete::{DeleteError, DeleteOutcome};
use crate::tui::app::{App, Mode};

pub(super) fn handle_delete(app: &mut App, key: KeyEvent) {
    if let Some(cursor) = app.picking_target {
        handle_target_picker(app, key, cursor);
        return;
    }

    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => confirm_delete(app),
        KeyCode::Char('t') => {
            let current = app.delete.reassign_to().cloned();
            let targets = app.delete.targets(app.session.tree());
            if targets.is_empty() {
                app.set_error("there is no other category to move components to");
                return;
            }
            let start = current
                .and_then(|id| targets.iter().position(|t| t.id == id))
                .unwrap_or(0);
            app.picking_target = Some(start);
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            if app.delete.cancel() {
                app.mode = Mode::Navigate;
                app.status = None;
            }
        }
        _ => {}
    }
}

fn handle_target_picker(app: &mut App, key: KeyEvent, cursor: usize) {
    let targets = app.delete.targets(app.session.tree());
    let last = targets.len().saturating_sub(1);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.picking_target = Some((cursor + 1).min(last)),
        KeyCode::Char('k') | KeyCode::Up => app.picking_target = Some(cursor.saturating_sub(1)),
        KeyCode::Enter => {
            if let Some(option) = targets.get(cursor)
                && let Err(e) = app.delete.choose_target(app.session.tree(), &option.id)
            {
                app.set_error(e.to_string());
            }
            app.picking_target = None;
        }
        KeyCode::Esc => app.picking_target = None,
        _ => {}
    }
}

fn confirm_delete(app: &mut App) {
    if !app.delete.can_confirm() {
        if let Some(target) = app.delete.target()
            && target.needs_reassignment()
        {
            app.set_error(format!(
                "choose where to move the {} components first (t)",
                target.component_count
            ));
        }
        return;
    }

    match app.delete.submit(&mut app.session) {
        Ok(DeleteOutcome::Deleted(id)) => {
            app.mode = Mode::Navigate;
            app.after_mutation();
            if !app.session.is_stale() {
                app.set_info(format!("deleted category {}", id));
            }
        }
        // The dialog stays open; its error line shows the message
        Ok(DeleteOutcome::Failed(message)) => app.set_error(message),
        Err(DeleteError::Busy) => {}
        Err(e) => app.set_error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crossterm::event::KeyCode;
    use pretty_assertions::assert_eq;

    use crate::io::backend::BackendError;
    use crate::io::memory::MemoryBackend;
    use crate::model::category::CategoryId;
    use crate::ops::delete::DeletePhase;
    use crate::tui::app::Mode;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::{ch, key};
    use crate::tui::render::test_helpers::{app_with_backend, demo_app};

    #[test]
    fn test_y_without_target_is_refused() {
        let mut app = demo_app();
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, ch('y'));
        assert_eq!(app.mode, Mode::Delete);
        assert_eq!(app.delete.phase(), DeletePhase::Confirming);
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("choose where to move the 4 components first (t)")
        );
        assert!(app.tree().contains(&CategoryId::from(1)));
    }

    #[test]
    fn test_pick_target_then_confirm() {
        let backend = Rc::new(MemoryBackend::seeded());
        let mut app = app_with_backend(&backend);
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, ch('t'));
        assert_eq!(app.picking_target, Some(0));
        // first offer is SMD, the deleted node's first child
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.picking_target, None);
        assert_eq!(app.delete.reassign_to(), Some(&CategoryId::from(2)));

        handle_key(&mut app, ch('y'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(!app.tree().contains(&CategoryId::from(1)));
        assert_eq!(app.tree().get(&CategoryId::from(2)).unwrap().component_count, 16);
        assert!(backend
            .calls()
            .contains(&"DELETE 1 force=true reassign_to=2".to_string()));
    }

    #[test]
    fn test_picker_moves_and_escapes() {
        let mut app = demo_app();
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, ch('t'));
        handle_key(&mut app, ch('j'));
        handle_key(&mut app, ch('j'));
        assert_eq!(app.picking_target, Some(2));
        handle_key(&mut app, ch('k'));
        assert_eq!(app.picking_target, Some(1));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.picking_target, None);
        assert_eq!(app.delete.reassign_to(), None);
        assert_eq!(app.mode, Mode::Delete);
    }

    #[test]
    fn test_failure_keeps_dialog_and_target() {
        let backend = Rc::new(MemoryBackend::seeded());
        let mut app = app_with_backend(&backend);
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, ch('t'));
        handle_key(&mut app, key(KeyCode::Enter));
        backend.fail_next(BackendError::Status {
            status: 500,
            message: None,
        });
        handle_key(&mut app, ch('y'));
        assert_eq!(app.mode, Mode::Delete);
        assert_eq!(app.delete.error(), Some("Failed to delete category"));
        assert_eq!(app.delete.reassign_to(), Some(&CategoryId::from(2)));
    }

    #[test]
    fn test_retry_after_failure_deletes() {
        let backend = Rc::new(MemoryBackend::seeded());
        let mut app = app_with_backend(&backend);
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, ch('t'));
        handle_key(&mut app, key(KeyCode::Enter));
        backend.fail_next(BackendError::Status {
            status: 503,
            message: None,
        });
        handle_key(&mut app, ch('y'));
        assert_eq!(app.delete.phase(), DeletePhase::Confirming);

        handle_key(&mut app, ch('y'));
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.delete.phase(), DeletePhase::Idle);
        assert!(!app.tree().contains(&CategoryId::from(1)));
        let calls = backend.calls();
        let deletes: Vec<&str> = calls
            .iter()
            .map(String::as_str)
            .filter(|c| c.starts_with("DELETE"))
            .collect();
        assert_eq!(
            deletes,
            vec!["DELETE 1 force=true reassign_to=2", "DELETE 1 force=true reassign_to=2"]
        );
        assert_eq!(calls.last().map(String::as_str), Some("GET include_empty=true"));
    }

    #[test]
    fn test_esc_cancels() {
        let mut app = demo_app();
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Navigate);
        assert_eq!(app.delete.phase(), DeletePhase::Idle);
    }

    #[test]
    fn test_empty_leaf_deletes_directly() {
        let backend = Rc::new(MemoryBackend::seeded());
        let mut app = app_with_backend(&backend);
        // Connectors is the last row and holds nothing
        handle_key(&mut app, ch('G'));
        handle_key(&mut app, ch('d'));
        handle_key(&mut app, ch('y'));
        assert!(!app.tree().contains(&CategoryId::from(12)));
        assert!(backend.calls().contains(&"DELETE 12 force=false".to_string()));
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("deleted category 12")
        );
    }
}
