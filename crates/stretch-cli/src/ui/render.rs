use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph},
};
use stretch_types::EntryStatus;

use super::app::App;
use super::view_model::{ExerciseRow, UiModal, UiView, status_marker};

pub(crate) fn draw(f: &mut ratatui::Frame, app: &App) {
    let view = UiView::from_app(app);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(f.area());

    let header = Paragraph::new(Line::from(format!("stretch  →  {}", view.header)))
        .block(Block::default().borders(Borders::ALL).title("Routine"));
    f.render_widget(header, chunks[0]);

    draw_current(f, &view, chunks[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .ratio(view.gauge_ratio)
        .label(view.gauge_label.clone())
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black));
    f.render_widget(gauge, chunks[2]);

    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| match row {
            ExerciseRow::Group(label) => ListItem::new(Line::from(Span::styled(
                label.clone(),
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ))),
            ExerciseRow::Item {
                label,
                duration,
                status,
            } => {
                let style = match status {
                    EntryStatus::Completed => Style::default().fg(Color::DarkGray),
                    EntryStatus::Active => Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                    EntryStatus::Pending => Style::default(),
                };
                ListItem::new(Line::from(Span::styled(
                    format!("  {} {label}  [{duration}]", status_marker(*status)),
                    style,
                )))
            }
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Exercises"));
    f.render_widget(list, chunks[3]);

    let footer_block = Block::default().borders(Borders::ALL).title("Status");
    let footer_inner = footer_block.inner(chunks[4]);
    f.render_widget(footer_block, chunks[4]);
    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(footer_inner);
    f.render_widget(Paragraph::new(Line::from(view.status_line.clone())), footer_chunks[0]);
    f.render_widget(Paragraph::new(Line::from(view.keys_line.clone())), footer_chunks[1]);

    match &view.modal {
        Some(UiModal::Help { body }) => {
            let area = centered_rect(60, 60, f.area());
            f.render_widget(Clear, area);
            let block = Block::default().title("Help").borders(Borders::ALL);
            f.render_widget(Paragraph::new(body.clone()).block(block), area);
        }
        Some(UiModal::Logs) => draw_logs(f, app),
        None => {}
    }
}

fn draw_current(f: &mut ratatui::Frame, view: &UiView, area: Rect) {
    let current = &view.current;
    let accent = if current.complete {
        Color::Green
    } else if current.is_buffer {
        Color::Cyan
    } else {
        Color::Yellow
    };
    let mut lines = vec![
        Line::from(Span::styled(
            current.title.clone(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(current.group.clone()),
    ];
    if !current.side.is_empty() {
        lines.push(Line::from(current.side.clone()));
    }
    if !current.complete {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            current.remaining.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(view.upcoming.clone()));

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(current.block_title.clone()),
        );
    f.render_widget(panel, area);
}

fn draw_logs(f: &mut ratatui::Frame, app: &App) {
    let area = centered_rect(90, 80, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Logs (Esc to close, ↑/↓ scroll)");
    let height = block.inner(area).height as usize;
    let total = app.logs.len();
    let end = total.saturating_sub(app.logs_scroll);
    let start = end.saturating_sub(height);
    let mut items: Vec<ListItem> = app
        .logs
        .iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|line| ListItem::new(line.clone()))
        .collect();
    if items.is_empty() {
        items.push(ListItem::new("<no logs>"));
    }
    f.render_widget(List::new(items).block(block), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_parent() {
        let parent = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 60, parent);
        assert!(inner.width <= 60 && inner.height <= 30);
        assert!(inner.x >= 20 && inner.y >= 10);
    }
}
