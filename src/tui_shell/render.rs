use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use super::app::App;
use super::log::{EntryKind, fmt_ts_ui};

pub(super) fn draw(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(area);

    // Header
    let collection = app
        .session
        .selected()
        .and_then(|id| app.session.snapshot().and_then(|s| s.collection(id)))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "(no collection)".to_string());

    let mut spans = vec![
        Span::styled(
            "Stepwise",
            Style::default().fg(Color::Black).bg(Color::White),
        ),
        Span::raw("  "),
        Span::raw(
            app.remote_url
                .clone()
                .unwrap_or_else(|| "(no remote configured)".to_string()),
        ),
        Span::raw("  "),
        Span::styled(collection, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::raw(format!("[{}]", app.session.filter().label())),
    ];
    if let Some(ts) = app.refreshed_at.as_deref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("refreshed {}", fmt_ts_ui(ts)),
            Style::default().fg(Color::Gray),
        ));
    }
    if app.stale {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("(stale)", Style::default().fg(Color::Red)));
    }
    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    // Step list
    let steps = app.session.steps();
    let mut rows: Vec<ListItem> = steps
        .iter()
        .map(|v| {
            let marker = if v.checked { "[x]" } else { "[ ]" };
            let row = format!(
                "{} step {}: {}",
                marker, v.step.step_number, v.step.description
            );
            if v.checked {
                ListItem::new(row).style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(row)
            }
        })
        .collect();
    if rows.is_empty() {
        rows.push(ListItem::new(format!(
            "(no {} steps)",
            app.session.filter().label()
        )));
    }

    let mut state = ListState::default();
    if !steps.is_empty() {
        state.select(Some(app.cursor.min(steps.len().saturating_sub(1))));
    }

    let checked = app.session.checked_count();
    let list = List::new(rows)
        .block(Block::default().borders(Borders::BOTTOM).title(format!(
            "steps ({} checked; [/]: collection, Tab: filter)",
            checked
        )))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    // Activity log, newest entries last
    let mut lines: Vec<Line> = Vec::new();
    for entry in &app.log {
        let style = match entry.kind {
            EntryKind::Output => Style::default().fg(Color::White),
            EntryKind::Error => Style::default().fg(Color::Red),
        };
        for (i, l) in entry.lines.iter().enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{} ", fmt_ts_ui(&entry.ts)),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(l.clone(), style),
                ]));
            } else {
                lines.push(Line::from(Span::styled(l.clone(), style)));
            }
        }
    }
    let visible = chunks[2].height.saturating_sub(1) as usize;
    if lines.len() > visible {
        lines.drain(..lines.len() - visible);
    }
    let log = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::BOTTOM).title("activity"));
    frame.render_widget(log, chunks[2]);

    // Input line or key hints
    match app.input_mode {
        Some(mode) => {
            let input = Paragraph::new(app.input.buf.as_str())
                .block(Block::default().borders(Borders::ALL).title(mode.title()));
            frame.render_widget(input, chunks[3]);
            let x = chunks[3].x + 1 + app.input.buf[..app.input.cursor].chars().count() as u16;
            frame.set_cursor_position((x.min(chunks[3].right().saturating_sub(2)), chunks[3].y + 1));
        }
        None => {
            let hints = Paragraph::new(
                "space: check  a: add  e: edit  c: complete  u: revert  d: delete  r: refresh  n: new collection  q: quit",
            )
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title("keys"));
            frame.render_widget(hints, chunks[3]);
        }
    }
}
