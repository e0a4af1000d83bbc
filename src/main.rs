use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing::{info, warn};

mod app;
mod cli;
mod config;
mod error;
mod events;
mod generator;
mod logging;
mod model;
mod pipeline;
mod report;
mod scoring;
mod simulator;
mod sources;
mod theme;
mod ui;

use app::{App, Backends, Tab};
use cli::Cli;
use events::AppEvent;
use theme::Theme;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        logging::init_headless();
        let code = cli::run(command, cli.config.as_deref(), cli.output);
        std::process::exit(code);
    }

    logging::init_dashboard();
    let config = cli::load_config(cli.config.as_deref())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let backends = Backends::from_config(&config);
    let app = App::new(config, backends)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    let theme = Theme::load_or_default("theme.toml");
    info!("dashboard started");
    let result = run_app(&mut terminal, app, &theme);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    theme: &Theme,
) -> io::Result<()> {
    while app.running {
        terminal.draw(|frame| ui::render(frame, &app, theme))?;

        let event = events::next_event(FRAME_INTERVAL)?;
        let now = Instant::now();
        match event {
            AppEvent::Tick => {}
            AppEvent::Quit => app.quit(),
            AppEvent::NextTab => app.next_tab(),
            AppEvent::PrevTab => app.prev_tab(),
            AppEvent::ScrollUp | AppEvent::MouseScrollUp => app.scroll_up(),
            AppEvent::ScrollDown | AppEvent::MouseScrollDown => {
                let max_scroll = ui::body_max_scroll(screen_rect(terminal)?, &app);
                app.scroll_down(max_scroll);
            }
            AppEvent::PrevReport => app.prev_report(),
            AppEvent::NextReport => app.next_report(),
            AppEvent::StartExecution => {
                if let Err(err) = app.start_execution(now, report::now_epoch_secs()) {
                    warn!(%err, "execution not started");
                }
                app.select_tab(Tab::Dashboard);
            }
            AppEvent::CancelExecution => {
                app.cancel_execution(now);
            }
            AppEvent::Generate => {
                if let Err(err) = app.start_generation(now) {
                    warn!(%err, "generation not started");
                }
                app.select_tab(Tab::Generator);
            }
            AppEvent::CancelGeneration => {
                app.cancel_generation();
            }
            AppEvent::SelectTop => {
                app.select_top_tests();
            }
            AppEvent::ReloadReports => app.reload_reports(),
            AppEvent::MouseLeftClick(column, row) => {
                if let Some(tab) = ui::tab_hit_test(screen_rect(terminal)?, column, row) {
                    app.select_tab(tab);
                }
            }
        }
        app.on_tick(Instant::now());
    }

    info!("dashboard closed");
    Ok(())
}

fn screen_rect(terminal: &Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<Rect> {
    let size = terminal.size()?;
    Ok(Rect::new(0, 0, size.width, size.height))
}
