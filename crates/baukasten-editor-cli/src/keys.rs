use baukasten_editor_engine::editing::{Key, KeyInput, Modifiers};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Maps a terminal key event to editor input. Keys the editor has no use
/// for map to `None`.
pub fn to_key_input(event: &KeyEvent) -> Option<KeyInput> {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };
    let modifiers = Modifiers {
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        meta: event.modifiers.contains(KeyModifiers::META)
            || event.modifiers.contains(KeyModifiers::SUPER),
    };
    Some(KeyInput::with_modifiers(key, modifiers))
}

/// Ctrl+C and Ctrl+Q leave the editor.
pub fn is_quit(event: &KeyEvent) -> bool {
    event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('q'))
}

/// Terminal focus reports: `Some(true)` when gained, `Some(false)` when lost.
/// Only delivered while focus change reporting is enabled.
pub fn focus_change(event: &Event) -> Option<bool> {
    match event {
        Event::FocusGained => Some(true),
        Event::FocusLost => Some(false),
        _ => None,
    }
}
