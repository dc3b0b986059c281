use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::tree::CategoryTree;
use crate::tui::app::App;
use crate::util::unicode;

use super::push_highlighted_spans;

/// Whether `idx` is the last among its siblings
fn is_last_sibling(tree: &CategoryTree, idx: usize) -> bool {
    let siblings = match tree.slot(idx).parent {
        Some(parent) => &tree.slot(parent).children,
        None => tree.roots(),
    };
    siblings.last() == Some(&idx)
}

/// Tree guide for a row: `│  ` / `   ` per ancestor level, then `├ ` / `└ `
fn tree_prefix(tree: &CategoryTree, idx: usize) -> String {
    let slot = tree.slot(idx);
    if slot.depth == 0 {
        return String::new();
    }
    let mut levels = Vec::with_capacity(slot.depth);
    let mut current = slot.parent;
    while let Some(ancestor) = current {
        // roots get no guide column
        if tree.slot(ancestor).parent.is_some() {
            levels.push(if is_last_sibling(tree, ancestor) { "   " } else { "\u{2502}  " });
        }
        current = tree.slot(ancestor).parent;
    }
    levels.reverse();
    let mut prefix = levels.concat();
    prefix.push_str(if is_last_sibling(tree, idx) { "\u{2514} " } else { "\u{251C} " });
    prefix
}

/// Render the category tree content area
pub fn render_tree_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let rows = app.rows();

    if rows.is_empty() {
        let msg = if app.search_input.is_empty() {
            " No categories"
        } else {
            " No matching categories"
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(app.theme.dim).bg(bg));
        frame.render_widget(empty, area);
        return;
    }

    // Keep the cursor on screen
    let visible_height = (area.height as usize).max(1);
    app.clamp_cursor();
    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if app.cursor >= app.scroll_offset + visible_height {
        app.scroll_offset = app.cursor + 1 - visible_height;
    }

    let search_re = app.active_search_re();
    let highlight_style = Style::default()
        .fg(app.theme.search_match_fg)
        .bg(app.theme.search_match_bg)
        .add_modifier(Modifier::BOLD);
    let width = area.width as usize;
    let tree = &app.visible;
    let full = app.session.tree();

    let end = rows.len().min(app.scroll_offset + visible_height);
    let mut lines: Vec<Line> = Vec::with_capacity(visible_height);
    for (row, &idx) in rows.iter().enumerate().take(end).skip(app.scroll_offset) {
        let is_cursor = row == app.cursor;
        let record = &tree.slot(idx).record;
        let row_bg = if is_cursor { app.theme.selection_bg } else { bg };
        let dim_style = Style::default().fg(app.theme.dim).bg(row_bg);
        let mut spans: Vec<Span> = Vec::new();

        if is_cursor {
            spans.push(Span::styled(
                "\u{258E}",
                Style::default().fg(app.theme.selection_border).bg(row_bg),
            ));
        } else {
            spans.push(Span::styled(" ", Style::default().bg(row_bg)));
        }

        spans.push(Span::styled(tree_prefix(tree, idx), dim_style));

        let mut name_style = Style::default()
            .fg(app.theme.category_color(record.color.as_deref()))
            .bg(row_bg);
        if is_cursor {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }
        let name_width = width.saturating_sub(super::helpers::spans_width(&spans) + 14);
        let name = unicode::truncate_to_width(&record.name, name_width);
        push_highlighted_spans(&mut spans, &name, name_style, highlight_style, search_re.as_ref());

        spans.push(Span::styled(format!(" #{}", record.id), dim_style));

        // Counts come from the full tree so filtering never hides components
        let count = match full.index_of(&record.id) {
            Some(full_idx) => {
                let own = record.component_count;
                let total = full.subtree_components(full_idx);
                if total == own {
                    format!("{}", own)
                } else {
                    format!("{}/{}", own, total)
                }
            }
            None => record.component_count.to_string(),
        };
        let used = super::helpers::spans_width(&spans);
        let count_width = unicode::display_width(&count);
        if used + count_width + 1 < width {
            spans.push(Span::styled(
                " ".repeat(width - used - count_width - 1),
                Style::default().bg(row_bg),
            ));
            spans.push(Span::styled(count, dim_style));
        }
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
