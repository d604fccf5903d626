mod catalog;
mod help;
mod palette;

use palette::Palette;

use crate::app::App;
use ratatui::Frame;

/// Top-level render dispatch.
pub fn render(app: &App, frame: &mut Frame) {
    let palette = Palette::for_theme(app.theme.theme());
    catalog::render(app, &palette, frame);

    // Render help overlay on top if active
    if app.show_help {
        help::render(&palette, frame);
    }
}
