use crate::activity::ActivityLine;
use crate::input::TextInput;
use crate::model::{Focus, Model, ProfileRow};
use crate::styles;
use anyhow::Result;
use crosspost_common::NetworkKind;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Margin, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use std::io::Stdout;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, model: &Model) -> Result<()> {
    term.draw(|frame| render(frame, model))?;
    Ok(())
}

fn render(frame: &mut Frame, model: &Model) {
    let area = frame.area();
    let accounts_h = (model.sessions.len().max(1) as u16 + 2).min(10);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(accounts_h),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" Crosspost ", styles::title()),
        Span::styled("· one post, every account", styles::dim()),
    ]));
    frame.render_widget(header, layout[0]);

    render_register_row(frame, model, layout[1]);
    render_accounts(frame, model, layout[2]);
    render_compose(frame, model, layout[3]);
    render_send_row(frame, model, layout[4]);
    render_activity(frame, &model.activity, layout[5]);

    let status_line = Line::from(vec![
        Span::raw(" "),
        Span::styled(model.spinner(), styles::label()),
        Span::raw(" "),
        if model.busy > 0 {
            Span::styled("Working…", styles::label())
        } else {
            Span::styled("Idle", styles::success())
        },
        Span::styled(
            format!(
                " • ops: {} • Tab focus • Ctrl+R refresh • Ctrl+Q quit",
                model.busy
            ),
            styles::dim(),
        ),
    ]);
    frame.render_widget(Paragraph::new(status_line), layout[6]);
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(styles::focused())
    } else {
        block
    }
}

fn kind_style(kind: NetworkKind) -> Style {
    match kind {
        NetworkKind::Mastodon => styles::mastodon(),
        NetworkKind::Misskey => styles::misskey(),
    }
}

fn render_register_row(frame: &mut Frame, model: &Model, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14),
            Constraint::Fill(3),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Length(14),
        ])
        .split(area);

    let kind = Paragraph::new(Line::from(vec![
        Span::styled("‹ ", styles::dim()),
        Span::styled(model.kind.as_str(), kind_style(model.kind)),
        Span::styled(" ›", styles::dim()),
    ]))
    .block(field_block(" Type ", model.focus == Focus::Kind));
    frame.render_widget(kind, cols[0]);

    let masked = "•".repeat(model.key.as_str().chars().count());
    let fields: [(&str, &TextInput, Focus, String); 3] = [
        (" Instance ", &model.instance, Focus::Instance, model.instance.as_str().to_string()),
        (" Username ", &model.username, Focus::Username, model.username.as_str().to_string()),
        (" Access key ", &model.key, Focus::Key, masked),
    ];
    for ((title, input, focus, shown), rect) in fields.into_iter().zip(&cols[1..4]) {
        let focused = model.focus == focus;
        let widget = Paragraph::new(Span::styled(shown, styles::value()))
            .block(field_block(title, focused));
        frame.render_widget(widget, *rect);
        if focused {
            let before = &input.as_str()[..input.cursor()];
            let col = if focus == Focus::Key {
                before.chars().count() as u16
            } else {
                UnicodeWidthStr::width(before) as u16
            };
            place_caret(frame, *rect, col, 0);
        }
    }

    let button_style = if model.focus == Focus::Register {
        styles::button_focused()
    } else {
        styles::button()
    };
    let button = Paragraph::new(Line::from(Span::styled(" Register ", button_style)))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(button, cols[4]);
}

fn render_accounts(frame: &mut Frame, model: &Model, area: Rect) {
    let items: Vec<ListItem> = if model.sessions.is_empty() {
        vec![ListItem::new(Span::styled(
            "No accounts yet. Fill in the form above and press Enter.",
            styles::dim(),
        ))]
    } else {
        model
            .sessions
            .iter()
            .enumerate()
            .map(|(i, session)| {
                let marker = Span::styled("● ", kind_style(session.kind));
                let line = match model.profiles.get(i) {
                    Some(ProfileRow::Loaded(p)) => {
                        let mut spans = vec![
                            marker,
                            Span::styled(p.username.clone(), styles::value()),
                            Span::styled(format!("  {}", p.instance), styles::system()),
                        ];
                        if let Some(avatar) = &p.avatar_url {
                            spans.push(Span::styled(format!("  {avatar}"), styles::dim()));
                        }
                        Line::from(spans)
                    }
                    Some(ProfileRow::Failed {
                        instance, message, ..
                    }) => Line::from(vec![
                        marker,
                        Span::styled(format!("{instance}: {message}"), styles::error()),
                    ]),
                    None => Line::from(vec![
                        marker,
                        Span::styled(session.handle(), styles::system()),
                        Span::styled("  …", styles::dim()),
                    ]),
                };
                ListItem::new(line)
            })
            .collect()
    };
    let title = format!(" Accounts ({}) ", model.sessions.len());
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn render_compose(frame: &mut Frame, model: &Model, area: Rect) {
    let focused = model.focus == Focus::Compose;
    let (line, col_text) = model.compose.line_and_column();
    let visible_h = area.height.saturating_sub(2) as usize;
    let scroll = (line + 1).saturating_sub(visible_h) as u16;

    let body = Paragraph::new(model.compose.as_str().to_string())
        .style(styles::value())
        .scroll((scroll, 0))
        .block(field_block(
            " What's happening? · Ctrl+Enter or Ctrl+S to post ",
            focused,
        ));
    frame.render_widget(Clear, area);
    frame.render_widget(body, area);

    if focused {
        let col = UnicodeWidthStr::width(col_text) as u16;
        place_caret(frame, area, col, (line as u16).saturating_sub(scroll));
    }
}

fn render_send_row(frame: &mut Frame, model: &Model, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(10), Constraint::Min(1)])
        .split(area);

    let button_style = if model.focus == Focus::Send {
        styles::button_focused()
    } else {
        styles::button()
    };
    let button = Paragraph::new(Line::from(Span::styled(" Send ", button_style)))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(button, cols[0]);

    let chars = model.compose.as_str().chars().count();
    let hint = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {chars} chars"), styles::dim()),
        Span::styled(
            format!(" → {} account(s)", model.sessions.len()),
            styles::system(),
        ),
    ]));
    frame.render_widget(hint, cols[1].inner(Margin::new(0, 1)));
}

fn render_activity(frame: &mut Frame, lines: &[ActivityLine], area: Rect) {
    let visible_h = area.height.saturating_sub(2) as usize;
    let content_width = area.width.saturating_sub(2) as usize;
    let wrapped = wrap_activity(lines, content_width);
    let start = wrapped.len().saturating_sub(visible_h);

    let items: Vec<ListItem> = wrapped[start..]
        .iter()
        .map(|(text, style)| ListItem::new(Line::from(Span::styled(text.clone(), *style))))
        .collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Activity ")),
        area,
    );
}

fn place_caret(frame: &mut Frame, area: Rect, col: u16, row: u16) {
    let max_x = area.x + area.width.saturating_sub(2);
    frame.set_cursor_position(Position {
        x: (area.x + 1 + col).min(max_x),
        y: area.y + 1 + row,
    });
}

fn wrap_activity(lines: &[ActivityLine], width: usize) -> Vec<(String, Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for entry in lines {
        let style = entry.style;
        for raw_line in entry.text.split('\n') {
            let segments = wrap(raw_line, effective_width);
            if segments.is_empty() {
                out.push((String::new(), style));
            } else {
                out.extend(segments.into_iter().map(|seg| (seg.into_owned(), style)));
            }
        }
    }

    out
}
