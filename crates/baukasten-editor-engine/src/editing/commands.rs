//! Edit commands and key input accepted by the [`Editor`](super::Editor).

/// An edit or caret command. Offsets are flat offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Types text at the caret, replacing any selected range.
    InsertText { text: String },
    InsertLineBreak,
    /// Deletes the selection, or the unit before the caret. A mention is
    /// removed as a whole.
    DeleteBackward,
    /// Deletes the selection, or the unit after the caret.
    DeleteForward,
    /// Inserts pasted plain text; `\r\n` and `\r` become line breaks.
    Paste { text: String },
    /// Replaces the content with a plain string (controlled value).
    SetValue { text: String },
    Select { anchor: usize, focus: usize },
    MoveLeft { extend: bool },
    MoveRight { extend: bool },
    MoveHome { extend: bool },
    MoveEnd { extend: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Ctrl, Alt or Meta held. These chords are left to the host.
    pub fn has_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A key press delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

impl From<Key> for KeyInput {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}
