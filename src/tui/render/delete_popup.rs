use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::util::unicode;

/// Rows of the reassignment picker shown at once
const PICKER_ROWS: usize = 8;

/// Render the delete confirmation dialog over the tree
pub fn render_delete_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(target) = app.delete.target() else {
        return;
    };
    let bg = app.theme.background;
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let bright_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let popup_w = area.width.saturating_sub(4).clamp(20, 64).min(area.width);
    let inner_w = popup_w.saturating_sub(4) as usize;

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        unicode::truncate_to_width(&target.breadcrumb, inner_w),
        bright_style,
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "{} components, {} subcategories",
            target.component_count, target.child_count
        ),
        text_style,
    )));

    if target.needs_reassignment() {
        let tree = app.session.tree();
        let chosen = app.delete.reassign_to().and_then(|id| tree.breadcrumb_of(id));
        let mut spans = vec![Span::styled("Move components to: ", text_style)];
        match chosen {
            Some(crumb) => spans.push(Span::styled(
                unicode::truncate_to_width(&crumb, inner_w.saturating_sub(20)),
                Style::default().fg(app.theme.cyan).bg(bg),
            )),
            None => spans.push(Span::styled(
                "none, press t",
                Style::default().fg(app.theme.yellow).bg(bg),
            )),
        }
        lines.push(Line::from(spans));
    } else if target.child_count > 0 {
        lines.push(Line::from(Span::styled(
            "Move its subcategories out first",
            dim_style,
        )));
    }

    // Reassignment picker
    if let Some(cursor) = app.picking_target {
        let targets = app.delete.targets(app.session.tree());
        lines.push(Line::from(""));
        let start = cursor.saturating_sub(PICKER_ROWS - 1);
        for (i, option) in targets.iter().enumerate().skip(start).take(PICKER_ROWS) {
            let selected = i == cursor;
            let marker = if selected { "\u{25B8} " } else { "  " };
            let style = if selected {
                Style::default()
                    .fg(app.theme.text_bright)
                    .bg(app.theme.selection_bg)
            } else {
                text_style
            };
            lines.push(Line::from(vec![
                Span::styled(marker, key_style),
                Span::styled(
                    unicode::truncate_to_width(&option.breadcrumb, inner_w.saturating_sub(2)),
                    style,
                ),
            ]));
        }
    }

    if let Some(error) = app.delete.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            unicode::truncate_to_width(error, inner_w),
            Style::default().fg(app.theme.red).bg(bg),
        )));
    }

    // Footer: the confirm key dims while it is disabled
    let confirm_style = if app.delete.can_confirm() {
        key_style
    } else {
        dim_style
    };
    lines.push(Line::from(""));
    let mut footer = vec![Span::styled("y", confirm_style), Span::styled(" delete  ", dim_style)];
    if target.needs_reassignment() {
        footer.push(Span::styled("t", key_style));
        footer.push(Span::styled(" target  ", dim_style));
    }
    footer.push(Span::styled("Esc", key_style));
    footer.push(Span::styled(" cancel", dim_style));
    lines.push(Line::from(footer));

    let popup_h = (lines.len() as u16 + 2).min(area.height);
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .title(Span::styled(
            format!(" Delete category {} ", target.name),
            bright_style,
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    let padded = Rect {
        x: inner.x + 1,
        width: inner.width.saturating_sub(2),
        ..inner
    };
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), padded);
}
