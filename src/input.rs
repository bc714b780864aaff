//! Key and mouse bindings.

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Restart,
    Mute,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('r') if no_mod => Action::Restart,
        KeyCode::Char('m') if no_mod => Action::Mute,
        _ => Action::None,
    }
}

/// Pointer gesture in terminal cells, left button only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(u16, u16),
    Moved(u16, u16),
    Up,
}

/// Map mouse event to a pointer gesture; anything but the left button is
/// ignored.
pub fn mouse_to_pointer(mouse: MouseEvent) -> Option<PointerEvent> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            Some(PointerEvent::Down(mouse.column, mouse.row))
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            Some(PointerEvent::Moved(mouse.column, mouse.row))
        }
        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::Up),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, MouseButton};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char('q'), KeyModifiers::NONE)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Esc, KeyModifiers::NONE)), Action::Quit);
        assert_eq!(
            key_to_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn test_alt_modifier_is_ignored() {
        assert_eq!(key_to_action(key(KeyCode::Char('p'), KeyModifiers::ALT)), Action::None);
    }

    #[test]
    fn test_right_button_ignored() {
        let mouse = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(mouse_to_pointer(mouse), None);
    }

    #[test]
    fn test_left_drag_maps_to_moved() {
        let mouse = MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: 7,
            row: 2,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(mouse_to_pointer(mouse), Some(PointerEvent::Moved(7, 2)));
    }
}
