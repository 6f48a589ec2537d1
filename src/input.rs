use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

// Discrete input -> scroll/chrome actions. Wheel and drag deltas reach the
// motion controller as raw amounts; everything else toggles app state.

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    ToggleHelp,
    ToggleHud,
    ToggleAuto,
    ToggleOvalInput,
    CyclePalette,
    Reseed,
    Wheel(f32),
    Drag(f32),
    Impulse(f32),
    DebugRotate(f32),
}

// rows are 4 subpixels tall; drags convert at that ratio
const DRAG_ROW_SUBPIXELS: f32 = 4.0;

#[derive(Default)]
pub(crate) struct InputState {
    drag_row: Option<u16>,
}

pub(crate) fn map_key(k: &KeyEvent) -> Option<Action> {
    if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHelp),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::ToggleHud),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::ToggleAuto),
        KeyCode::Char('o') | KeyCode::Char('O') => Some(Action::ToggleOvalInput),
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Action::CyclePalette),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reseed),
        KeyCode::Up => Some(Action::Impulse(1.0)),
        KeyCode::Down => Some(Action::Impulse(-1.0)),
        KeyCode::Left => Some(Action::DebugRotate(-0.1)),
        KeyCode::Right => Some(Action::DebugRotate(0.1)),
        _ => None,
    }
}

pub(crate) fn map_mouse(state: &mut InputState, m: &MouseEvent, wheel_step: f32) -> Option<Action> {
    match m.kind {
        MouseEventKind::ScrollUp => Some(Action::Wheel(-wheel_step)),
        MouseEventKind::ScrollDown => Some(Action::Wheel(wheel_step)),
        MouseEventKind::Down(MouseButton::Left) => {
            state.drag_row = Some(m.row);
            None
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let prev = state.drag_row.replace(m.row)?;
            let delta = (prev as f32 - m.row as f32) * DRAG_ROW_SUBPIXELS;
            if delta == 0.0 {
                None
            } else {
                Some(Action::Drag(delta))
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            state.drag_row = None;
            None
        }
        _ => None,
    }
}

/// Drain whatever arrived since last frame without blocking the tick.
pub(crate) fn collect_actions(
    state: &mut InputState,
    wheel_step: f32,
) -> anyhow::Result<Vec<Action>> {
    let mut out = Vec::new();
    while event::poll(Duration::from_millis(0))? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                if let Some(a) = map_key(&k) {
                    out.push(a);
                }
            }
            Event::Mouse(m) => {
                if let Some(a) = map_mouse(state, &m, wheel_step) {
                    out.push(a);
                }
            }
            _ => {}
        }
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}
