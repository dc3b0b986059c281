pub mod delete_popup;
pub mod help_overlay;
mod helpers;
pub mod status_row;
pub mod tree_view;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use regex::Regex;

use super::app::{App, Mode};
use crate::util::unicode;

/// Main render function, dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: header (1 row) | tree | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    tree_view::render_tree_view(frame, app, chunks[1]);

    if app.mode == Mode::Delete {
        delete_popup::render_delete_popup(frame, app, chunks[1]);
    }

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }

    status_row::render_status_row(frame, app, chunks[2]);
}

/// Breadcrumb of the selection on the left, totals on the right
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let tree = app.tree();

    let crumb = app
        .selected_id()
        .and_then(|id| tree.breadcrumb_of(&id))
        .unwrap_or_default();
    let mut totals = format!(
        "{} categories  {} components",
        tree.len(),
        tree.total_components()
    );
    if app.session.is_stale() {
        totals.push_str("  [stale]");
    }

    let totals_width = unicode::display_width(&totals) + 1;
    let crumb = unicode::truncate_to_width(&crumb, width.saturating_sub(totals_width + 2));
    let mut spans = vec![Span::styled(
        format!(" {}", crumb),
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )];
    let used = helpers::spans_width(&spans);
    if used + totals_width <= width {
        spans.push(Span::styled(
            " ".repeat(width - used - totals_width),
            Style::default().bg(bg),
        ));
        let totals_color = if app.session.is_stale() {
            app.theme.yellow
        } else {
            app.theme.dim
        };
        spans.push(Span::styled(totals, Style::default().fg(totals_color).bg(bg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        area,
    );
}

/// Push spans for text with regex match highlighting. If no regex or no matches,
/// pushes a single span with `base_style`. Otherwise splits text at match boundaries.
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let re = match search_re {
        Some(r) => r,
        None => {
            spans.push(Span::styled(text.to_string(), base_style));
            return;
        }
    };

    let mut last_end = 0;
    for m in re.find_iter(text) {
        if m.start() > last_end {
            spans.push(Span::styled(
                text[last_end..m.start()].to_string(),
                base_style,
            ));
        }
        spans.push(Span::styled(
            text[m.start()..m.end()].to_string(),
            highlight_style,
        ));
        last_end = m.end();
    }
    if last_end < text.len() || text.is_empty() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
}
