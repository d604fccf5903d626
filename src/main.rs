mod accordion;
mod app;
mod catalog;
mod config;
mod filter;
mod loader;
mod render;
mod theme;
mod ui;

use app::{App, InputMode};
use catalog::Catalog;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use config::Settings;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use theme::{PreferenceStore, ThemeController};

/// Browse a JSON catalog of firmware ROM builds grouped by Android version
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Catalog location: a file path or an http(s) URL
    #[arg(short, long, global = true, env = "ROM_EXPLORER_SOURCE")]
    source: Option<String>,

    /// Preferences file holding the saved theme
    #[arg(long, global = true, env = "ROM_EXPLORER_PREFS")]
    prefs: Option<PathBuf>,

    /// Initial Android version filter for the explorer ("all" shows everything)
    #[arg(short, long, global = true)]
    filter: Option<String>,
}

impl Cli {
    /// The rendered page always opens on "all", so `--filter` is explorer-only.
    fn validate(&self) -> Result<(), clap::Error> {
        if self.filter.is_some() && matches!(self.command, Some(Commands::Render { .. })) {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--filter applies only to the explorer (`run`), not to `render`",
            ));
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the TUI explorer (default)
    Run,
    /// Render the catalog as a standalone HTML page
    Render {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }
    let settings = Settings::resolve(cli.source.as_deref(), cli.prefs, cli.filter.as_deref())?;
    let theme = ThemeController::load(PreferenceStore::new(settings.preferences_path.clone()));

    let catalog = match load_with_indicator(&settings).await {
        Ok(catalog) => catalog,
        Err(message) => {
            if let Some(Commands::Render { output }) = &cli.command {
                let page = render::render_failure_page(&message, theme.theme());
                write_output(output.as_ref(), &page)?;
            }
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Render { output } => {
            let page = render::render_page(&catalog, theme.theme());
            write_output(output.as_ref(), &page)?;
        }
        Commands::Run => {
            let mut app = App::new(&catalog, theme, &settings.initial_filter);
            drop(catalog);

            // Init terminal
            let mut terminal = ratatui::init();

            // Initial page size setup
            let size = terminal.size()?;
            app.update_page_size(size.height);

            // Main loop
            let result = run_app(&mut terminal, &mut app);

            // Restore terminal
            ratatui::restore();

            if let Err(e) = result {
                log::error!("terminal loop failed: {e}");
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Load the catalog behind a spinner. On failure the spinner line is replaced
/// by the failure message, which is also returned for the HTML failure page.
async fn load_with_indicator(settings: &Settings) -> Result<Catalog, String> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Загрузка прошивок из {}...", settings.source));
    pb.enable_steady_tick(Duration::from_millis(100));

    let progress = |bytes: u64| {
        pb.set_message(format!(
            "Загрузка прошивок из {}... {}",
            settings.source,
            indicatif::HumanBytes(bytes)
        ));
    };

    match loader::load(&settings.source, &progress).await {
        Ok(catalog) => {
            pb.finish_with_message(catalog::counter_label(catalog::count_entries(&catalog)));
            Ok(catalog)
        }
        Err(e) => {
            log::error!("Ошибка загрузки ROM: {e}");
            let message = e.user_message();
            pb.abandon_with_message(format!("Не удалось загрузить список прошивок: {message}"));
            Err(message)
        }
    }
}

fn write_output(output: Option<&PathBuf>, page: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, page)?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(page.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll for events with a 250ms timeout
        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, key);
                }
                Event::Resize(_, height) => {
                    app.update_page_size(height);
                }
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Help toggle (global)
    if key.code == KeyCode::Char('?') && app.input_mode == InputMode::Normal {
        app.show_help = !app.show_help;
        return;
    }

    // If help is showing, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.input_mode == InputMode::Editing {
        handle_search_input(app, key);
    } else {
        handle_catalog_key(app, key);
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    let mut changed = false;
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search.clear();
            changed = true;
        }
        KeyCode::Backspace => {
            app.search.pop();
            changed = true;
        }
        KeyCode::Char(c) => {
            app.search.push(c);
            changed = true;
        }
        _ => {}
    }

    if changed {
        app.apply_search();
    }
}

fn handle_catalog_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Down | KeyCode::Char('j') => app.list_next(),
        KeyCode::Up | KeyCode::Char('k') => app.list_prev(),
        KeyCode::PageDown => app.list_page_down(),
        KeyCode::PageUp => app.list_page_up(),
        KeyCode::Char('g') => app.list_first(),
        KeyCode::Char('G') => app.list_last(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_expand(),
        KeyCode::Right | KeyCode::Char('l') => app.filter_next(),
        KeyCode::Left | KeyCode::Char('h') => app.filter_prev(),
        KeyCode::Char(c @ '0'..='9') => {
            if let Some(index) = c.to_digit(10) {
                app.filter_activate(index as usize);
            }
        }
        KeyCode::Tab => app.link_next(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('o') => {
            if let Some(link) = app.selected_link() {
                let url = link.url.to_string();
                app.status_msg = match std::process::Command::new("xdg-open").arg(&url).spawn() {
                    Ok(_) => format!("Opening: {url}"),
                    Err(e) => {
                        log::warn!("xdg-open failed: {e}");
                        format!("Link: {url} (could not open browser)")
                    }
                };
            }
        }
        KeyCode::Char('y') => {
            if let Some(link) = app.selected_link() {
                let url = link.url.to_string();
                app.status_msg = copy_to_clipboard(&url);
            }
        }
        KeyCode::Esc => {
            // Clear search
            if !app.search.is_empty() {
                app.search.clear();
                app.apply_search();
            }
        }
        _ => {}
    }
}

/// Try xclip, then wl-copy. Returns the status line to show.
fn copy_to_clipboard(text: &str) -> String {
    let candidates: [(&str, &[&str]); 2] = [("xclip", &["-selection", "clipboard"]), ("wl-copy", &[])];
    for (program, args) in candidates {
        if let Ok(mut child) = std::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .spawn()
        {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            let _ = child.wait();
            return format!("Copied: {text}");
        }
    }
    format!("Link: {text} (clipboard not available)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_filter_rejected_for_render() {
        let cli = Cli::try_parse_from(["rom-explorer", "render", "--filter", "14"]).unwrap();
        let err = cli.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["rom-explorer", "--filter", "14"]).unwrap();
        assert!(cli.validate().is_ok());
        let cli = Cli::try_parse_from(["rom-explorer", "run", "--filter", "14"]).unwrap();
        assert!(cli.validate().is_ok());
        let cli = Cli::try_parse_from(["rom-explorer", "render", "-o", "out.html"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_tab_cycles_links_not_filter() {
        let catalog: Catalog = serde_json::from_str(
            r#"{"roms":[
                {"family":"LineageOS","android":"14","versions":[{"name":"21.0",
                    "links":[{"name":"SF","url":"https://sf.example"}],
                    "variants":[{"type":"GApps","links":[{"name":"Mirror","url":"https://m.example"}]}]}]},
                {"family":"crDroid","android":"13","versions":[{"name":"9.10"}]}
            ]}"#,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let theme = ThemeController::load(PreferenceStore::new(dir.path().join("preferences.json")));
        let mut app = App::new(&catalog, theme, &Filter::All);

        // Open group, family, then move onto the build.
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Down));
        handle_key(&mut app, key(KeyCode::Enter));
        handle_key(&mut app, key(KeyCode::Down));
        assert_eq!(app.selected_version().map(|v| v.name.as_str()), Some("21.0"));

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.link_selected, 1);
        assert_eq!(app.filters.current(), &Filter::All);
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.link_selected, 0);

        handle_key(&mut app, key(KeyCode::Right));
        assert_eq!(app.filters.current().value(), "14");
    }
}
