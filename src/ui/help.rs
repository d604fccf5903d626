use super::palette::Palette;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("?", "Toggle this help"),
            ("q", "Quit application"),
            ("t", "Switch light/dark theme (saved)"),
        ],
    ),
    (
        "Catalog",
        &[
            ("↑/k ↓/j", "Navigate up/down"),
            ("PgUp/PgDn", "Move one page"),
            ("g/G", "Jump to first/last row"),
            ("Enter/Space", "Expand or collapse section"),
            ("/", "Search families and builds (supports *)"),
            ("Esc", "Clear search"),
        ],
    ),
    (
        "Filter",
        &[
            ("←/→", "Previous/next Android version"),
            ("0-9", "Pick filter button (0 = all)"),
        ],
    ),
    (
        "Build",
        &[
            ("Tab", "Cycle download links"),
            ("o", "Open selected link in browser"),
            ("y", "Copy selected link to clipboard"),
        ],
    ),
];

pub fn render(palette: &Palette, frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let mut help_text = vec![Line::from("")];
    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            format!("  {title}"),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        )));
        for (key, action) in *keys {
            help_text.push(Line::from(vec![
                Span::styled(format!("    {key:<12}"), Style::default().fg(palette.badge)),
                Span::raw(*action),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(" Help: Keybindings ")
                .title_bottom(Line::from(" Press any key to close ").style(palette.dim())),
        )
        .style(palette.base());

    frame.render_widget(help, area);
}

/// Create a centered rectangle using percentage of parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
