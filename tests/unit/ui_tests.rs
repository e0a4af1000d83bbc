use super::*;
use std::time::{Duration, Instant};

use crate::app::Backends;
use crate::config::{AppConfig, CounterMode};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;

fn mock_app() -> App {
    App::new(AppConfig::default(), Backends::mock()).expect("app should build")
}

fn render_text(app: &App, width: u16, height: u16) -> String {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("test terminal should initialize");
    let theme = Theme::default();
    terminal
        .draw(|frame| render(frame, app, &theme))
        .expect("render should succeed");
    buffer_to_string(terminal.backend().buffer())
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn render_shows_tabs_and_help_text() {
    let app = mock_app();
    let text = render_text(&app, 140, 40);
    assert!(text.contains("GameTester"));
    assert!(text.contains("Home"));
    assert!(text.contains("Dashboard"));
    assert!(text.contains("Generator"));
    assert!(text.contains("Reports"));
    assert!(text.contains("Tab/Shift+Tab switch"));
}

#[test]
fn home_lists_the_four_agents() {
    let app = mock_app();
    let text = render_text(&app, 140, 40);
    assert!(text.contains("Planning Agent"));
    assert!(text.contains("Test Generator"));
    assert!(text.contains("Execution Agent"));
    assert!(text.contains("Validation Agent"));
    assert!(text.contains("https://play.ezygamers.com/"));
}

#[test]
fn dashboard_shows_counters_and_agent_cards() {
    let mut config = AppConfig::default();
    config.simulation.counters = CounterMode::Fixed;
    let mut app = App::new(config, Backends::mock()).expect("app");
    app.select_tab(Tab::Dashboard);
    let t0 = Instant::now();
    app.start_execution(t0, 45_296).expect("start");
    app.on_tick(t0 + Duration::from_millis(5_500));

    let text = render_text(&app, 140, 40);
    assert!(text.contains("Generated"));
    assert!(text.contains("25"));
    assert!(text.contains("running"));
    assert!(text.contains(&format!("started {}", format_clock(45_296))));
    assert!(text.contains("Execution Agent"));
    assert!(text.contains("Executing top 10 tests..."));
    assert!(text.contains("Recent Activity"));
    assert!(text.contains("Execution running"));
}

#[test]
fn generator_lists_cases_with_selection_marks() {
    let mut app = mock_app();
    app.select_tab(Tab::Generator);
    let t0 = Instant::now();
    app.start_generation(t0).expect("generate");
    app.on_tick(t0 + Duration::from_secs(3));
    app.select_top_tests();

    let text = render_text(&app, 140, 40);
    assert!(text.contains("[x] tc-001"));
    assert!(text.contains("Basic Number Input Validation"));
    assert!(text.contains("edge-case"));
    assert!(text.contains("100%"));
}

#[test]
fn reports_show_summary_and_artifacts() {
    let mut app = mock_app();
    app.select_tab(Tab::Reports);
    let text = render_text(&app, 140, 60);
    assert!(text.contains("report-001"));
    let stamp = app
        .selected_report()
        .map(|report| format_timestamp(report.timestamp_epoch_secs()))
        .expect("report selected");
    assert!(text.contains(&stamp));
    assert!(text.contains("2 passed"));
    assert!(text.contains("Success 40%"));
    assert!(text.contains("Coverage 85%"));
    assert!(text.contains("+repeat"));
    assert!(text.contains("-cross-agent"));
    assert!(text.contains("Artifacts"));
    assert!(text.contains("crash-dump.log"));
}

#[test]
fn tab_hit_test_maps_header_clicks() {
    let screen = Rect::new(0, 0, 116, 40);
    assert_eq!(tab_hit_test(screen, 5, 1), None);
    assert_eq!(tab_hit_test(screen, 17, 1), Some(Tab::Home));
    assert_eq!(tab_hit_test(screen, 115, 2), Some(Tab::Reports));
    assert_eq!(tab_hit_test(screen, 50, 10), None);
}

#[test]
fn body_max_scroll_counts_overflowing_lines() {
    let mut app = mock_app();
    app.select_tab(Tab::Reports);
    assert_eq!(body_max_scroll(Rect::new(0, 0, 140, 200), &app), 0);
    assert!(body_max_scroll(Rect::new(0, 0, 140, 20), &app) > 0);
}

#[test]
fn working_dots_animate_over_ticks() {
    let first = working_dots(0);
    let second = working_dots(2);
    let third = working_dots(4);
    assert_ne!(first, second);
    assert_ne!(second, third);
}

#[test]
fn title_bar_bg_lightens_inactive_and_highlights_active() {
    assert_eq!(title_bar_bg(Color::Rgb(10, 250, 0), false), Color::Rgb(22, 255, 12));
    assert_eq!(title_bar_bg(Color::Rgb(10, 10, 10), true), ACTIVE_TITLE_BG);
    assert_eq!(title_bar_bg(Color::Blue, false), Color::Blue);
}
