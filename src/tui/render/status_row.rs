use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::helpers::push_right_hint;
use crate::tui::app::{App, Mode};

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let bg_style = Style::default().bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let mut spans: Vec<Span> = Vec::new();

    // A pending message wins over everything but the prompt line
    if app.mode != Mode::Prompt
        && let Some(status) = &app.status
    {
        let color = if status.is_error {
            app.theme.red
        } else {
            app.theme.green
        };
        spans.push(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color).bg(bg),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)).style(bg_style), area);
        return;
    }

    match app.mode {
        Mode::Navigate => {
            // An applied filter shows dimmed
            if !app.search_input.is_empty() {
                spans.push(Span::styled(format!("/{}", app.search_input), dim_style));
            }
            let hint = if app.search_input.is_empty() {
                "/ filter  a add  r rename  d delete  ? help"
            } else {
                "Esc clear filter  ? help"
            };
            if app.show_key_hints {
                push_right_hint(&mut spans, hint, width, bg_style, dim_style);
            }
        }
        Mode::Search => {
            // Filter prompt: /query▌
            spans.push(Span::styled(
                format!("/{}", app.search_input),
                Style::default().fg(app.theme.text_bright).bg(bg),
            ));
            spans.push(Span::styled(
                "\u{258C}",
                Style::default().fg(app.theme.highlight).bg(bg),
            ));
            push_right_hint(&mut spans, "Enter keep  Esc clear", width, bg_style, dim_style);
        }
        Mode::Prompt => {
            if let Some(prompt) = &app.prompt {
                let name = &prompt.editor.draft.name;
                let cursor = prompt.cursor.min(name.len());
                spans.push(Span::styled(
                    format!("{}: ", prompt.title),
                    Style::default().fg(app.theme.highlight).bg(bg),
                ));
                let text_style = Style::default().fg(app.theme.text_bright).bg(bg);
                spans.push(Span::styled(name[..cursor].to_string(), text_style));
                spans.push(Span::styled(
                    "\u{258C}",
                    Style::default().fg(app.theme.highlight).bg(bg),
                ));
                spans.push(Span::styled(name[cursor..].to_string(), text_style));
                if let Some(status) = &app.status {
                    spans.push(Span::styled(
                        format!("  {}", status.text),
                        Style::default().fg(app.theme.red).bg(bg),
                    ));
                } else {
                    push_right_hint(&mut spans, "Enter save  Esc cancel", width, bg_style, dim_style);
                }
            }
        }
        Mode::Delete => {
            let hint = if app.picking_target.is_some() {
                "j/k move  Enter choose  Esc back"
            } else {
                "y delete  t move components to  Esc cancel"
            };
            push_right_hint(&mut spans, hint, width, bg_style, dim_style);
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(bg_style);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::{ch, key, type_str};
    use crate::tui::render::test_helpers::{TERM_W, demo_app, render_to_string};
    use crossterm::event::KeyCode;
    use pretty_assertions::assert_eq;

    fn status_line(app: &App) -> String {
        render_to_string(TERM_W, 1, |frame, area| render_status_row(frame, app, area))
    }

    #[test]
    fn test_navigate_shows_hints() {
        let app = demo_app();
        let out = status_line(&app);
        assert!(out.ends_with("/ filter  a add  r rename  d delete  ? help"), "{out}");
    }

    #[test]
    fn test_search_shows_query_with_cursor() {
        let mut app = demo_app();
        handle_key(&mut app, ch('/'));
        type_str(&mut app, "cer");
        let out = status_line(&app);
        assert!(out.starts_with("/cer\u{258C}"), "{out}");
        assert!(out.ends_with("Enter keep  Esc clear"), "{out}");
    }

    #[test]
    fn test_prompt_shows_title_and_cursor() {
        let mut app = demo_app();
        handle_key(&mut app, ch('A'));
        type_str(&mut app, "Fuse");
        handle_key(&mut app, key(KeyCode::Left));
        let out = status_line(&app);
        assert!(out.starts_with("New top-level category: Fus\u{258C}e"), "{out}");
    }

    #[test]
    fn test_error_message_replaces_hints() {
        let mut app = demo_app();
        app.set_error("Failed to load categories");
        assert_eq!(status_line(&app), " Failed to load categories");
    }
}
