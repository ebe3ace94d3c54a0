//! Key-combination grammar accepted by `keyboard.press`.
//!
//! `combo := token ("+" token)*`. Tokens are case-insensitive; any number of
//! modifiers may precede at most one key, which must come last. Punctuation
//! may be written as the character (`Ctrl+-`) or by name (`Ctrl+Minus`); the
//! Plus key is `Ctrl++` or `Ctrl+Plus`. Combos are sent to the server in
//! canonical form, e.g. `Ctrl+Shift+S` or `Ctrl+Minus`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    Meta, // Windows key / Command key
}

impl Modifier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Control),
            "alt" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "meta" | "win" | "cmd" | "command" => Some(Modifier::Meta),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Modifier::Control => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Meta => "Win",
        }
    }
}

/// Non-modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Letter or digit, stored uppercase
    Char(char),
    /// F1..F24
    Function(u8),
    /// Numpad 0..9
    Numpad(u8),

    // Navigation
    Up, Down, Left, Right,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Enter, Tab, Escape, Space,

    // Punctuation (US layout)
    Plus, Minus, Equals, Comma, Period, Slash, Semicolon,
    Quote, LeftBracket, RightBracket, Backslash, Backtick,

    // Numpad operators
    NumpadAdd, NumpadSubtract, NumpadMultiply, NumpadDivide, NumpadDecimal,

    // Special
    Insert, PrintScreen, ScrollLock, Pause,
    CapsLock, NumLock,
}

impl Key {
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();

        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Some(Key::Char(c.to_ascii_uppercase()));
            }
            if let Some(key) = Self::from_symbol(c) {
                return Some(key);
            }
        }

        if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=24).contains(&n) {
                return Some(Key::Function(n));
            }
        }

        if let Some(rest) = lower.strip_prefix("numpad").or_else(|| lower.strip_prefix("num")) {
            if let Ok(n) = rest.parse::<u8>() {
                return (n <= 9).then_some(Key::Numpad(n));
            }
        }

        match lower.as_str() {
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "pageup" | "pgup" => Some(Key::PageUp),
            "pagedown" | "pgdn" => Some(Key::PageDown),
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "enter" | "return" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "escape" | "esc" => Some(Key::Escape),
            "space" => Some(Key::Space),
            "plus" => Some(Key::Plus),
            "minus" | "dash" | "hyphen" => Some(Key::Minus),
            "equals" | "equal" => Some(Key::Equals),
            "comma" => Some(Key::Comma),
            "period" | "dot" => Some(Key::Period),
            "slash" => Some(Key::Slash),
            "semicolon" => Some(Key::Semicolon),
            "quote" | "apostrophe" => Some(Key::Quote),
            "leftbracket" | "openbracket" => Some(Key::LeftBracket),
            "rightbracket" | "closebracket" => Some(Key::RightBracket),
            "backslash" => Some(Key::Backslash),
            "backtick" | "grave" => Some(Key::Backtick),
            "numpadadd" | "add" => Some(Key::NumpadAdd),
            "numpadsubtract" | "subtract" => Some(Key::NumpadSubtract),
            "numpadmultiply" | "multiply" => Some(Key::NumpadMultiply),
            "numpaddivide" | "divide" => Some(Key::NumpadDivide),
            "numpaddecimal" | "decimal" => Some(Key::NumpadDecimal),
            "insert" | "ins" => Some(Key::Insert),
            "printscreen" | "prtsc" => Some(Key::PrintScreen),
            "scrolllock" => Some(Key::ScrollLock),
            "pause" => Some(Key::Pause),
            "capslock" => Some(Key::CapsLock),
            "numlock" => Some(Key::NumLock),
            _ => None,
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        let key = match c {
            '+' => Key::Plus,
            '-' => Key::Minus,
            '=' => Key::Equals,
            ',' => Key::Comma,
            '.' => Key::Period,
            '/' => Key::Slash,
            ';' => Key::Semicolon,
            '\'' => Key::Quote,
            '[' => Key::LeftBracket,
            ']' => Key::RightBracket,
            '\\' => Key::Backslash,
            '`' => Key::Backtick,
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::Char(c) => return write!(f, "{}", c),
            Key::Function(n) => return write!(f, "F{}", n),
            Key::Numpad(n) => return write!(f, "Numpad{}", n),
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "PageUp",
            Key::PageDown => "PageDown",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Enter => "Enter",
            Key::Tab => "Tab",
            Key::Escape => "Escape",
            Key::Space => "Space",
            Key::Plus => "Plus",
            Key::Minus => "Minus",
            Key::Equals => "Equals",
            Key::Comma => "Comma",
            Key::Period => "Period",
            Key::Slash => "Slash",
            Key::Semicolon => "Semicolon",
            Key::Quote => "Quote",
            Key::LeftBracket => "LeftBracket",
            Key::RightBracket => "RightBracket",
            Key::Backslash => "Backslash",
            Key::Backtick => "Backtick",
            Key::NumpadAdd => "NumpadAdd",
            Key::NumpadSubtract => "NumpadSubtract",
            Key::NumpadMultiply => "NumpadMultiply",
            Key::NumpadDivide => "NumpadDivide",
            Key::NumpadDecimal => "NumpadDecimal",
            Key::Insert => "Insert",
            Key::PrintScreen => "PrintScreen",
            Key::ScrollLock => "ScrollLock",
            Key::Pause => "Pause",
            Key::CapsLock => "CapsLock",
            Key::NumLock => "NumLock",
        };
        f.write_str(name)
    }
}

/// Parsed key combination such as `Ctrl+C` or a bare `Enter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub modifiers: Vec<Modifier>,
    pub key: Option<Key>,
}

impl FromStr for KeyCombo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: String| Error::Validation(format!("invalid key combination {:?}: {}", s, why));

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty".to_string()));
        }

        // `+` is the separator, so the Plus key itself is spelled `Ctrl++` or `+`
        let (body, trailing_plus) = if trimmed == "+" {
            ("", true)
        } else if let Some(body) = trimmed.strip_suffix("++") {
            (body, true)
        } else {
            (trimmed, false)
        };

        let mut tokens: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.split('+').map(str::trim).collect()
        };
        if trailing_plus {
            tokens.push("plus");
        }

        let mut modifiers = Vec::new();
        let mut key = None;

        for token in tokens {
            if token.is_empty() {
                return Err(invalid("empty token".to_string()));
            }
            if key.is_some() {
                return Err(invalid("the key must be the last token".to_string()));
            }
            if let Some(m) = Modifier::parse(token) {
                if modifiers.contains(&m) {
                    return Err(invalid(format!("duplicate modifier {}", m.name())));
                }
                modifiers.push(m);
            } else if let Some(k) = Key::parse(token) {
                key = Some(k);
            } else {
                return Err(invalid(format!("unknown key {:?}", token)));
            }
        }

        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.modifiers.iter().map(|m| m.name().to_string()).collect();
        if let Some(key) = self.key {
            parts.push(key.to_string());
        }
        f.write_str(&parts.join("+"))
    }
}
