use ratatui::prelude::*;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Gauge, Padding, Paragraph};

use crate::app::{App, Tab};
use crate::model::{Agent, Execution, TestCase};
use crate::report::{ExecutionReport, format_clock, format_timestamp};
use crate::scoring;
use crate::theme::Theme;

const TEXT_PADDING: u16 = 1;
const STATUS_HEIGHT: u16 = 3;
const TITLE_BAR_HEIGHT: u16 = 3;
const BRAND_WIDTH: u16 = 16;
const CARD_HEIGHT: u16 = 5;
const GAUGE_HEIGHT: u16 = 3;
const AGENT_CARD_HEIGHT: u16 = 6;
const SUMMARY_HEIGHT: u16 = 6;
const ACTIVE_TITLE_BG: Color = Color::Rgb(90, 145, 200);
const ACTIVE_TITLE_FG: Color = Color::Black;
const STATUS_HELP_TEXT: &str =
    "Tab/Shift+Tab switch | s start | x cancel | g generate | c stop | t top | Left/Right report | q quit";

fn split_screen(screen: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(TITLE_BAR_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(screen)
}

fn tab_areas(header: Rect) -> [Rect; 4] {
    let [_brand, tabs] =
        Layout::horizontal([Constraint::Length(BRAND_WIDTH), Constraint::Min(0)]).areas(header);
    Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(tabs)
}

/// Area of the scrollable part of a tab's body.
fn scroll_area(body: Rect, tab: Tab) -> Rect {
    match tab {
        Tab::Home => body,
        Tab::Dashboard => {
            let [_cards, _gauge, _agents, activity] = dashboard_areas(body);
            activity
        }
        Tab::Generator => {
            let [_summary, _gauge, list] = Layout::vertical([
                Constraint::Length(SUMMARY_HEIGHT),
                Constraint::Length(GAUGE_HEIGHT),
                Constraint::Min(0),
            ])
            .areas(body);
            list
        }
        Tab::Reports => {
            let [_summary, details] =
                Layout::vertical([Constraint::Length(SUMMARY_HEIGHT), Constraint::Min(0)])
                    .areas(body);
            details
        }
    }
}

fn dashboard_areas(body: Rect) -> [Rect; 4] {
    Layout::vertical([
        Constraint::Length(CARD_HEIGHT),
        Constraint::Length(GAUGE_HEIGHT),
        Constraint::Length(AGENT_CARD_HEIGHT),
        Constraint::Min(0),
    ])
    .areas(body)
}

pub fn tab_hit_test(screen: Rect, x: u16, y: u16) -> Option<Tab> {
    let [header, _body, _status] = split_screen(screen);
    tab_areas(header)
        .into_iter()
        .zip(Tab::ALL)
        .find(|(area, _)| point_in_rect(*area, x, y))
        .map(|(_, tab)| tab)
}

pub fn body_max_scroll(screen: Rect, app: &App) -> u16 {
    let [_header, body, _status] = split_screen(screen);
    let area = scroll_area(body, app.active_tab);
    let [_title, content] = titled_areas(area, app.active_tab);
    let visible = content.height.saturating_sub(TEXT_PADDING * 2);
    let total = scroll_lines(app, &Theme::default()).len() as u16;
    total.saturating_sub(visible)
}

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let [header, body, status] = split_screen(frame.area());

    render_header(frame, header, app, theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.panel_bg)),
        body,
    );
    match app.active_tab {
        Tab::Home => render_scroll_panel(frame, body, "Overview", app, theme),
        Tab::Dashboard => render_dashboard(frame, body, app, theme),
        Tab::Generator => render_generator(frame, body, app, theme),
        Tab::Reports => render_reports(frame, body, app, theme),
    }

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.status_bg)),
        status,
    );
    let help = Paragraph::new(status_line_text(app))
        .style(Style::default().bg(theme.status_bg).fg(theme.muted_fg))
        .block(
            Block::default()
                .style(Style::default().bg(theme.status_bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        );
    frame.render_widget(help, status);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let [brand, _tabs] =
        Layout::horizontal([Constraint::Length(BRAND_WIDTH), Constraint::Min(0)]).areas(area);
    frame.render_widget(
        Paragraph::new("GameTester")
            .style(
                Style::default()
                    .bg(theme.header_bg)
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .style(Style::default().bg(theme.header_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        brand,
    );
    for (tab_area, tab) in tab_areas(area).into_iter().zip(Tab::ALL) {
        let active = app.active_tab == tab;
        let bg = title_bar_bg(theme.header_bg, active);
        let fg = if active {
            ACTIVE_TITLE_FG
        } else {
            theme.muted_fg
        };
        frame.render_widget(
            Paragraph::new(tab.title())
                .alignment(Alignment::Center)
                .style(Style::default().bg(bg).fg(fg))
                .block(
                    Block::default()
                        .style(Style::default().bg(bg))
                        .padding(Padding::uniform(TEXT_PADDING)),
                ),
            tab_area,
        );
    }
}

fn status_line_text(app: &App) -> String {
    let mut parts = vec![STATUS_HELP_TEXT.to_string()];
    if app.is_executing() {
        parts.push(format!("Execution running {}", working_dots(app.ticks)));
    }
    if app.generator().is_generating() {
        parts.push(format!("Generating {}", working_dots(app.ticks)));
    }
    parts.join(" | ")
}

fn working_dots(ticks: u64) -> &'static str {
    const FRAMES: [&str; 6] = ["[   ]", "[.  ]", "[.. ]", "[...]", "[ ..]", "[  .]"];
    FRAMES[((ticks / 2) as usize) % FRAMES.len()]
}

fn render_center_overlay(frame: &mut Frame, area: Rect, text: &str) {
    let width = 32u16.min(area.width.saturating_sub(2)).max(20);
    let height = 3u16;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height).intersection(area);
    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Rgb(255, 165, 0)))
            .block(
                Block::default()
                    .style(Style::default().bg(Color::Rgb(20, 20, 20)))
                    .padding(Padding::uniform(1)),
            ),
        overlay,
    );
}

fn titled_areas(area: Rect, tab: Tab) -> [Rect; 2] {
    let title_height = if tab == Tab::Home { 0 } else { 1 };
    Layout::vertical([Constraint::Length(title_height), Constraint::Min(0)]).areas(area)
}

fn render_section_title(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(format!(" {title}")).style(
            Style::default()
                .bg(title_bar_bg(theme.panel_bg, false))
                .fg(theme.muted_fg)
                .add_modifier(Modifier::BOLD),
        ),
        area,
    );
}

fn render_scroll_panel(frame: &mut Frame, area: Rect, title: &str, app: &App, theme: &Theme) {
    let [title_area, content] = titled_areas(area, app.active_tab);
    if title_area.height > 0 {
        render_section_title(frame, title_area, title, theme);
    }
    let lines = scroll_lines(app, theme);
    let visible = content.height.saturating_sub(TEXT_PADDING * 2);
    let max_scroll = (lines.len() as u16).saturating_sub(visible);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().bg(theme.panel_bg).fg(theme.text_fg))
            .scroll((app.scroll().min(max_scroll), 0))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.panel_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        content,
    );
}

fn scroll_lines(app: &App, theme: &Theme) -> Vec<Line<'static>> {
    match app.active_tab {
        Tab::Home => home_lines(app, theme),
        Tab::Dashboard => activity_lines(app, theme),
        Tab::Generator => case_lines(app.generator().cases(), theme),
        Tab::Reports => app
            .selected_report()
            .map(|report| report_detail_lines(report, theme))
            .unwrap_or_default(),
    }
}

fn home_lines(app: &App, theme: &Theme) -> Vec<Line<'static>> {
    let heading = Style::default()
        .fg(theme.primary)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled("Multi-agent game testing", heading)),
        Line::from(Span::styled(
            format!("Target: {}", app.config().generation.target_url),
            Style::default().fg(theme.muted_fg),
        )),
        Line::default(),
    ];
    let roles = [
        "Analyzes the target game and plans coverage",
        "Produces candidate test cases",
        "Runs the top-ranked cases against the game",
        "Repeats and cross-checks every result",
    ];
    for (agent, role) in app.execution().agents.iter().zip(roles) {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<18}", agent.name), Style::default().fg(theme.text_fg)),
            Span::styled(role, Style::default().fg(theme.muted_fg)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!(
            "{} phases configured, top {} cases executed per run",
            app.phase_count(),
            app.config().selection.top_k
        ),
        Style::default().fg(theme.muted_fg),
    )));
    lines
}

fn activity_lines(app: &App, theme: &Theme) -> Vec<Line<'static>> {
    app.activity()
        .iter()
        .rev()
        .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(theme.text_fg))))
        .collect()
}

fn render_dashboard(frame: &mut Frame, body: Rect, app: &App, theme: &Theme) {
    let [cards, gauge_area, agents_area, activity_area] = dashboard_areas(body);
    let execution = app.execution();

    let card_areas: [Rect; 4] = Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(cards);
    let cards_data = [
        (
            "Status",
            execution.status.label().to_string(),
            theme.execution_status(execution.status),
        ),
        (
            "Generated",
            execution.test_cases_generated.to_string(),
            theme.primary,
        ),
        (
            "Executed",
            execution.test_cases_executed.to_string(),
            theme.info,
        ),
        (
            "Validated",
            execution.validations_passed.to_string(),
            theme.success,
        ),
    ];
    for (area, (label, value, color)) in card_areas.into_iter().zip(cards_data) {
        render_stat_card(frame, area, label, &value, color, theme);
    }

    let label = format!(
        "{:.0}%  {}",
        execution.progress,
        execution_timing_text(execution, app.current_phase_index(), app.phase_count())
    );
    render_gauge(
        frame,
        gauge_area,
        execution.progress / 100.0,
        label,
        theme.primary,
        theme,
    );

    let agent_areas: [Rect; 4] =
        Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(agents_area);
    for (area, agent) in agent_areas.into_iter().zip(execution.agents.iter()) {
        render_agent_card(frame, area, agent, theme);
    }

    render_scroll_panel(frame, activity_area, "Recent Activity", app, theme);
}

fn execution_timing_text(
    execution: &Execution,
    phase_index: Option<usize>,
    phase_count: usize,
) -> String {
    let mut parts = Vec::new();
    if let Some(started) = execution.started_at_epoch_secs {
        parts.push(format!("started {}", format_clock(started)));
    }
    if let Some(index) = phase_index {
        parts.push(format!("phase {}/{}", index + 1, phase_count));
    }
    if let Some(duration_ms) = execution.duration_ms {
        parts.push(format!("took {:.1}s", duration_ms as f64 / 1000.0));
    }
    parts.push(format!("{} active", execution.active_agent_count()));
    parts.join(" | ")
}

fn render_stat_card(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    color: Color,
    theme: &Theme,
) {
    let bg = title_bar_bg(theme.panel_bg, false);
    let text = Text::from(vec![
        Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(theme.muted_fg),
        )),
        Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ]);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(bg)).block(
            Block::default()
                .style(Style::default().bg(bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        ),
        inset(area),
    );
}

fn render_gauge(
    frame: &mut Frame,
    area: Rect,
    ratio: f64,
    label: String,
    color: Color,
    theme: &Theme,
) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .style(Style::default().bg(theme.panel_bg))
                .padding(Padding::uniform(TEXT_PADDING)),
        )
        .gauge_style(Style::default().fg(color).bg(theme.status_bg))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(Span::styled(label, Style::default().fg(theme.active_fg)));
    frame.render_widget(gauge, area);
}

fn render_agent_card(frame: &mut Frame, area: Rect, agent: &Agent, theme: &Theme) {
    let bg = title_bar_bg(theme.panel_bg, false);
    let status_color = theme.agent_status(agent.status);
    let text = Text::from(vec![
        Line::from(Span::styled(
            agent.name.clone(),
            Style::default()
                .fg(theme.text_fg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                agent.status.label().to_string(),
                Style::default().fg(status_color),
            ),
            Span::styled(
                format!("  {}%", agent.progress),
                Style::default().fg(theme.muted_fg),
            ),
        ]),
        Line::from(Span::styled(
            agent.current_task.clone().unwrap_or_default(),
            Style::default().fg(theme.muted_fg),
        )),
    ]);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(bg)).block(
            Block::default()
                .style(Style::default().bg(bg))
                .padding(Padding::horizontal(TEXT_PADDING)),
        ),
        inset(area),
    );
}

fn render_generator(frame: &mut Frame, body: Rect, app: &App, theme: &Theme) {
    let [summary, gauge_area, list] = Layout::vertical([
        Constraint::Length(SUMMARY_HEIGHT),
        Constraint::Length(GAUGE_HEIGHT),
        Constraint::Min(0),
    ])
    .areas(body);
    let config = &app.config().generation;
    let generator = app.generator();
    let muted = Style::default().fg(theme.muted_fg);
    let text = Text::from(vec![
        Line::from(vec![
            Span::styled("Target      ", muted),
            Span::raw(config.target_url.clone()),
        ]),
        Line::from(vec![
            Span::styled("Test types  ", muted),
            Span::raw(config.test_types.join(", ")),
        ]),
        Line::from(vec![
            Span::styled("Focus       ", muted),
            Span::raw(config.focus_areas.join(", ")),
        ]),
        Line::from(vec![
            Span::styled("Limits      ", muted),
            Span::raw(format!(
                "max {} cases, top {} selected ({} selected now)",
                config.max_test_cases,
                app.config().selection.top_k,
                generator.selected_count()
            )),
        ]),
    ]);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.panel_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.panel_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        summary,
    );
    render_gauge(
        frame,
        gauge_area,
        f64::from(generator.progress()) / 100.0,
        format!(
            "{}%  {} cases",
            generator.progress(),
            generator.cases().len()
        ),
        theme.success,
        theme,
    );
    render_scroll_panel(frame, list, "Generated Test Cases", app, theme);
}

fn case_lines(cases: &[TestCase], theme: &Theme) -> Vec<Line<'static>> {
    cases
        .iter()
        .map(|case| {
            let mark = if case.selected { "[x]" } else { "[ ]" };
            Line::from(vec![
                Span::styled(format!("{mark} "), Style::default().fg(theme.primary)),
                Span::styled(format!("{:<8}", case.id), Style::default().fg(theme.muted_fg)),
                Span::styled(
                    format!("{:<7}", case.priority.label()),
                    Style::default().fg(theme.priority(case.priority)),
                ),
                Span::styled(
                    format!("{:<12}", case.category.label()),
                    Style::default().fg(theme.info),
                ),
                Span::styled(
                    format!("{:>7}", format_secs(case.estimated_duration)),
                    Style::default().fg(theme.muted_fg),
                ),
                Span::styled(
                    format!("  {:>4.0}  ", scoring::score(case)),
                    Style::default().fg(theme.warning),
                ),
                Span::styled(case.title.clone(), Style::default().fg(theme.text_fg)),
            ])
        })
        .collect()
}

fn render_reports(frame: &mut Frame, body: Rect, app: &App, theme: &Theme) {
    let [summary, details] =
        Layout::vertical([Constraint::Length(SUMMARY_HEIGHT), Constraint::Min(0)]).areas(body);
    let Some(report) = app.selected_report() else {
        render_center_overlay(frame, body, "No reports yet");
        return;
    };
    let (index, count) = app.report_position();
    let (minutes, seconds) = report.duration_split();
    let muted = Style::default().fg(theme.muted_fg);
    let text = Text::from(vec![
        Line::from(vec![
            Span::styled(
                report.id().to_string(),
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {}  ({}/{})",
                    format_timestamp(report.timestamp_epoch_secs()),
                    index + 1,
                    count
                ),
                muted,
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{} passed  ", report.passed()), Style::default().fg(theme.success)),
            Span::styled(format!("{} failed  ", report.failed()), Style::default().fg(theme.error)),
            Span::styled(
                format!("{} warnings  ", report.warnings()),
                Style::default().fg(theme.warning),
            ),
            Span::styled(format!("of {} tests", report.total_tests()), muted),
        ]),
        Line::from(vec![
            Span::styled("Success ", muted),
            Span::raw(format!("{}%  ", report.success_rate())),
            Span::styled("Avg ", muted),
            Span::raw(format!("{}s  ", report.average_duration())),
            Span::styled("Total ", muted),
            Span::raw(format!("{minutes}m {seconds}s  ")),
            Span::styled("Coverage ", muted),
            Span::raw(format!("{}%", report.coverage())),
        ]),
        Line::from(Span::styled(
            format!(
                "{} of {} fully validated",
                report.fully_validated_count(),
                report.total_tests()
            ),
            muted,
        )),
    ]);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.panel_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.panel_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        summary,
    );
    render_scroll_panel(frame, details, "Results", app, theme);
}

fn report_detail_lines(report: &ExecutionReport, theme: &Theme) -> Vec<Line<'static>> {
    let muted = Style::default().fg(theme.muted_fg);
    let mut lines = Vec::new();
    for result in report.results() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<8}", result.status.label()),
                Style::default().fg(theme.result_status(result.status)),
            ),
            Span::styled(format!("{:<8}", result.id), muted),
            Span::styled(result.name.clone(), Style::default().fg(theme.text_fg)),
            Span::styled(format!("  {}s", result.duration), muted),
        ]));
        lines.push(Line::from(vec![
            Span::raw("        "),
            check_span("repeat", result.validations.repeat_check, theme),
            check_span("cross-agent", result.validations.cross_agent_check, theme),
            Span::styled(
                format!(
                    "confidence {:.0}%",
                    result.validations.confidence * 100.0
                ),
                muted,
            ),
        ]));
        if !result.details.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("        {}", result.details),
                muted,
            )));
        }
    }
    let artifacts = report.artifact_index();
    if !artifacts.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Artifacts",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )));
        for entry in artifacts {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<26}", entry.artifact), Style::default().fg(theme.text_fg)),
                Span::styled(format!("{} {}", entry.result_id, entry.result_name), muted),
            ]));
        }
    }
    lines
}

fn check_span(label: &str, ok: bool, theme: &Theme) -> Span<'static> {
    let (mark, color) = if ok {
        ("+", theme.success)
    } else {
        ("-", theme.error)
    };
    Span::styled(format!("{mark}{label}  "), Style::default().fg(color))
}

fn format_secs(secs: u32) -> String {
    format!("{}m{:02}s", secs / 60, secs % 60)
}

fn inset(area: Rect) -> Rect {
    area.inner(Margin {
        horizontal: 1,
        vertical: 0,
    })
}

fn title_bar_bg(base: Color, active: bool) -> Color {
    if active {
        return ACTIVE_TITLE_BG;
    }
    match base {
        Color::Rgb(r, g, b) => {
            let delta = 12;
            Color::Rgb(
                adjust_channel(r, delta),
                adjust_channel(g, delta),
                adjust_channel(b, delta),
            )
        }
        _ => base,
    }
}

fn point_in_rect(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn adjust_channel(channel: u8, delta: i16) -> u8 {
    let value = channel as i16 + delta;
    value.clamp(0, 255) as u8
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;
