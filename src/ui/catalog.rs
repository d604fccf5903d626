use super::palette::Palette;
use crate::app::{App, InputMode, Row};
use crate::catalog::{families_label, versions_label};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(app: &App, palette: &Palette, frame: &mut Frame) {
    let area = frame.area();
    frame.render_widget(Block::default().style(palette.base()), area);

    // Layout: header(3) + filters(3) + search(3) + body(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(app, palette, frame, chunks[0]);
    render_filters(app, palette, frame, chunks[1]);
    render_search(app, palette, frame, chunks[2]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[3]);
    render_tree(app, palette, frame, body[0]);
    render_card(app, palette, frame, body[1]);

    render_status(app, palette, frame, chunks[4]);
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " ROM Catalog ",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  [{}]", app.counter_text()), palette.dim()),
        Span::styled(
            format!("  theme: {}", app.theme.theme().as_str()),
            palette.dim(),
        ),
    ]))
    .alignment(Alignment::Left)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(palette.border()),
    );
    frame.render_widget(header, area);
}

fn render_filters(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, button) in app.filters.buttons().iter().enumerate() {
        let label = match button.value() {
            crate::filter::ALL => "Все".to_string(),
            v => format!("Android {v}"),
        };
        let style = if app.filters.is_active(i) {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            palette.dim()
        };
        spans.push(Span::styled(format!(" {i}:{label} "), style));
        spans.push(Span::raw(" "));
    }

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border())
            .title(" Filter (←/→, 0-9) "),
    );
    frame.render_widget(bar, area);
}

fn render_search(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let style = match app.input_mode {
        InputMode::Editing => Style::default().fg(palette.badge),
        InputMode::Normal => palette.dim(),
    };
    let label = if app.input_mode == InputMode::Editing {
        " Search (Enter to apply, Esc to cancel): "
    } else {
        " Search (/): "
    };
    let bar = Paragraph::new(format!("{label}{}", app.search))
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(" Family / version "),
        );
    frame.render_widget(bar, area);

    // Set cursor position when editing
    if app.input_mode == InputMode::Editing {
        let x = area.x + 1 + label.width() as u16 + app.search.width() as u16;
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn row_line<'a>(app: &'a App, row: Row, palette: &Palette, width: usize) -> Line<'a> {
    match row {
        Row::Group(gi) => {
            let group = &app.groups[gi];
            let marker = if app.accordion.group_expanded(gi) { "▾" } else { "▸" };
            Line::from(vec![
                Span::styled(format!("{marker} "), Style::default().fg(palette.accent)),
                Span::styled(
                    format!("Android {}", group.platform_version),
                    Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", families_label(group.families.len())),
                    palette.dim(),
                ),
            ])
        }
        Row::Family(gi, fi) => {
            let family = &app.groups[gi].families[fi];
            let marker = if app.accordion.family_expanded(gi, fi) { "▾" } else { "▸" };
            Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{marker} "), Style::default().fg(palette.accent)),
                Span::styled(
                    truncate_str(&family.family, width.saturating_sub(20)),
                    Style::default().fg(palette.fg),
                ),
                Span::styled(
                    format!("  {}", versions_label(family.versions.len())),
                    palette.dim(),
                ),
            ])
        }
        Row::Version(gi, fi, vi) => {
            let version = &app.groups[gi].families[fi].versions[vi];
            let mut spans = vec![
                Span::raw("      "),
                Span::styled(
                    truncate_str(&version.name, width.saturating_sub(22)),
                    Style::default().fg(palette.fg),
                ),
            ];
            if let Some(date) = &version.date {
                spans.push(Span::styled(format!("  {date}"), Style::default().fg(palette.badge)));
            }
            Line::from(spans)
        }
    }
}

fn render_tree(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let width = area.width as usize;
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| ListItem::new(row_line(app, *row, palette, width)))
        .collect();

    let empty = items.is_empty();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.border())
                .title(" Firmware ")
                .title_bottom(
                    Line::from(format!(" {} groups ", app.visible_groups().len()))
                        .alignment(Alignment::Right),
                ),
        )
        .highlight_style(
            Style::default()
                .bg(palette.highlight_bg)
                .fg(palette.fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    if !empty {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_card(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border())
        .title(" Build ");

    let Some(version) = app.selected_version() else {
        let hint = Paragraph::new(Line::from(Span::styled(
            " Select a build to see its download links",
            palette.dim(),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let mut lines = vec![Line::from(vec![Span::styled(
        format!(" {}", version.name),
        Style::default().fg(palette.fg).add_modifier(Modifier::BOLD),
    )])];
    if let Some(date) = &version.date {
        lines.push(Line::from(Span::styled(
            format!(" {date}"),
            Style::default().fg(palette.badge),
        )));
    }
    lines.push(Line::from(""));

    let links = app.selected_links();
    if links.is_empty() {
        lines.push(Line::from(Span::styled(" No download links", palette.dim())));
    }
    for (i, link) in links.iter().enumerate() {
        let style = if i == app.link_selected {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.fg)
        };
        let marker = if i == app.link_selected { "▸" } else { " " };
        lines.push(Line::from(Span::styled(format!(" {marker} ⭳ {}", link.label), style)));
        lines.push(Line::from(Span::styled(
            format!("     {}", link.url),
            Style::default().fg(palette.dim).add_modifier(Modifier::UNDERLINED),
        )));
    }

    let card = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(card, area);
}

fn render_status(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (key, label) in [
        (" ↑↓", " Navigate  "),
        ("Enter", " Expand  "),
        ("Tab", " Link  "),
        ("o", " Open  "),
        ("t", " Theme  "),
        ("?", " Help  "),
        ("q", " Quit  "),
    ] {
        spans.push(Span::styled(key, palette.key()));
        spans.push(Span::raw(label));
    }
    spans.push(Span::styled(app.status_msg.as_str(), palette.dim()));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Truncate to `max_width` display columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        result.push(ch);
    }
    result.push('…');
    result
}
