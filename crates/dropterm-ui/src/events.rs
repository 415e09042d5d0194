//! Input events abstraction
//!
//! Defines platform-agnostic keys, modifiers and the actions they trigger.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Declares [`KeyCode`] together with the GDK keyval name of each key, so
/// parsing and formatting accelerators share one table.
macro_rules! key_codes {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Keyboard key codes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KeyCode {
            $($variant,)*
        }

        impl KeyCode {
            /// Every key code, in declaration order
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$variant,)*];

            /// GDK keyval name, as written in accelerator strings
            pub fn name(self) -> &'static str {
                match self {
                    $(KeyCode::$variant => $name,)*
                }
            }
        }
    };
}

key_codes! {
    A => "a", B => "b", C => "c", D => "d", E => "e", F => "f", G => "g",
    H => "h", I => "i", J => "j", K => "k", L => "l", M => "m", N => "n",
    O => "o", P => "p", Q => "q", R => "r", S => "s", T => "t", U => "u",
    V => "v", W => "w", X => "x", Y => "y", Z => "z",

    Key0 => "0", Key1 => "1", Key2 => "2", Key3 => "3", Key4 => "4",
    Key5 => "5", Key6 => "6", Key7 => "7", Key8 => "8", Key9 => "9",

    F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
    F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",

    Up => "Up", Down => "Down", Left => "Left", Right => "Right",
    Home => "Home", End => "End", PageUp => "Page_Up", PageDown => "Page_Down",

    Insert => "Insert", Delete => "Delete", Backspace => "BackSpace",
    Enter => "Return", Tab => "Tab", Escape => "Escape", Space => "space",

    Minus => "minus", Equals => "equal", Plus => "plus",
    LeftBracket => "bracketleft", RightBracket => "bracketright",
    Semicolon => "semicolon", Quote => "apostrophe", Backquote => "grave",
    Backslash => "backslash", Comma => "comma", Period => "period", Slash => "slash",
}

impl KeyCode {
    /// Character typed by this key without modifiers
    pub fn to_char(self) -> Option<char> {
        let mut chars = self.name().chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            // letters and digits are named by their character
            return Some(c);
        }
        Some(match self {
            Self::Space => ' ',
            Self::Minus => '-',
            Self::Equals => '=',
            Self::Plus => '+',
            Self::LeftBracket => '[',
            Self::RightBracket => ']',
            Self::Semicolon => ';',
            Self::Quote => '\'',
            Self::Backquote => '`',
            Self::Backslash => '\\',
            Self::Comma => ',',
            Self::Period => '.',
            Self::Slash => '/',
            _ => return None,
        })
    }

    /// Look a key up by GDK name (case-insensitive) or by its character
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| {
            key.name().eq_ignore_ascii_case(name)
                || key.to_char().is_some_and(|c| {
                    let mut chars = name.chars();
                    chars.next() == Some(c) && chars.next().is_none()
                })
        })
    }
}

/// A direction on screen, used for pane focus and monitor moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Action that can be bound to a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Page (tab) actions
    NewPage,
    RenamePage,
    ClosePage,
    NextPage,
    PrevPage,
    MovePageLeft,
    MovePageRight,

    // Pane actions
    SplitVertical,
    SplitHorizontal,
    CloseNode,
    /// Focus the neighbouring pane
    MoveFocus(Direction),

    // Window actions
    /// Move the window to the monitor on the left or right
    MoveScreen(Direction),
    ToggleFullscreen,
    Quit,

    // Edit actions
    Copy,
    Paste,
    SelectAll,

    // View actions
    ToggleScrollbars,
}

/// A keyboard shortcut
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl Shortcut {
    pub fn new(key: KeyCode, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(key: KeyCode) -> Self {
        Self::new(key, Modifiers::CTRL)
    }

    /// Create a shortcut with Ctrl+Shift modifiers
    pub fn ctrl_shift(key: KeyCode) -> Self {
        Self::new(key, Modifiers::CTRL | Modifiers::SHIFT)
    }
}
