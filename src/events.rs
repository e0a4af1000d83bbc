use std::io;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    Quit,
    NextTab,
    PrevTab,
    ScrollUp,
    ScrollDown,
    PrevReport,
    NextReport,
    StartExecution,
    CancelExecution,
    Generate,
    CancelGeneration,
    SelectTop,
    ReloadReports,
    MouseScrollUp,
    MouseScrollDown,
    MouseLeftClick(u16, u16),
}

fn map_key_event(key_event: KeyEvent) -> AppEvent {
    if key_event.kind != KeyEventKind::Press {
        return AppEvent::Tick;
    }

    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return AppEvent::Quit;
    }

    match key_event.code {
        KeyCode::Tab => AppEvent::NextTab,
        KeyCode::BackTab => AppEvent::PrevTab,
        KeyCode::Up | KeyCode::Char('k') => AppEvent::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') => AppEvent::ScrollDown,
        KeyCode::Left => AppEvent::PrevReport,
        KeyCode::Right => AppEvent::NextReport,
        KeyCode::Char('q') => AppEvent::Quit,
        KeyCode::Char('s') => AppEvent::StartExecution,
        KeyCode::Char('x') => AppEvent::CancelExecution,
        KeyCode::Char('g') => AppEvent::Generate,
        KeyCode::Char('c') => AppEvent::CancelGeneration,
        KeyCode::Char('t') => AppEvent::SelectTop,
        KeyCode::Char('r') => AppEvent::ReloadReports,
        _ => AppEvent::Tick,
    }
}

fn map_mouse_event_kind(kind: MouseEventKind) -> AppEvent {
    match kind {
        MouseEventKind::ScrollUp => AppEvent::MouseScrollUp,
        MouseEventKind::ScrollDown => AppEvent::MouseScrollDown,
        MouseEventKind::Down(MouseButton::Left) => AppEvent::MouseLeftClick(0, 0),
        _ => AppEvent::Tick,
    }
}

pub fn next_event(timeout: Duration) -> io::Result<AppEvent> {
    if event::poll(timeout)? {
        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                return Ok(map_key_event(key_event));
            }
            Event::Mouse(mouse_event) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse_event.kind {
                    return Ok(AppEvent::MouseLeftClick(
                        mouse_event.column,
                        mouse_event.row,
                    ));
                }
                return Ok(map_mouse_event_kind(mouse_event.kind));
            }
            _ => {}
        }
    }

    Ok(AppEvent::Tick)
}
