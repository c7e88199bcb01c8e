//! Keyboard input for the viewer.
//!
//! Key presses are translated into [`Command`]s. Text edits go to a
//! [`TextInput`], which enforces the length limit; everything else adjusts
//! the configuration or resets the simulation.

use winit::keyboard::{Key, ModifiersState, NamedKey};

/// Maximum number of characters in the seed text (line breaks included).
pub const MAX_TEXT_LEN: usize = 60;

/// What a key press asks the viewer to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Insert(String),
    Backspace,
    NewLine,
    /// Clear the text.
    Clear,
    /// Restart the simulation from rest.
    Reset,
    NextPreset,
    ToggleCaps,
    NextFont,
    FontSizeUp,
    FontSizeDown,
}

/// Map a key press to a command.
///
/// `text` is the text the key produced, if any. Keys pressed with Ctrl, Alt
/// or Super held are ignored so shortcuts don't type characters.
pub fn command_for(key: &Key, text: Option<&str>, modifiers: ModifiersState) -> Option<Command> {
    if modifiers.control_key() || modifiers.alt_key() || modifiers.super_key() {
        return None;
    }

    if let Key::Named(named) = key {
        let command = match named {
            NamedKey::Backspace => Some(Command::Backspace),
            NamedKey::Enter => Some(Command::NewLine),
            NamedKey::Escape => Some(Command::Clear),
            NamedKey::F5 => Some(Command::Reset),
            NamedKey::Tab => Some(Command::NextPreset),
            NamedKey::F2 => Some(Command::ToggleCaps),
            NamedKey::F3 => Some(Command::NextFont),
            NamedKey::PageUp => Some(Command::FontSizeUp),
            NamedKey::PageDown => Some(Command::FontSizeDown),
            _ => None,
        };
        if command.is_some() {
            return command;
        }
    }

    match (key, text) {
        (Key::Character(_) | Key::Named(NamedKey::Space), Some(t))
            if !t.is_empty() && !t.chars().any(char::is_control) =>
        {
            Some(Command::Insert(t.to_string()))
        }
        _ => None,
    }
}

/// Bounded seed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    max_chars: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::with_max(MAX_TEXT_LEN)
    }

    pub fn with_max(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            max_chars,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Append `s`. Rejected entirely if the result would be too long.
    pub fn insert(&mut self, s: &str) -> bool {
        if s.is_empty() || self.len() + s.chars().count() > self.max_chars {
            return false;
        }
        self.text.push_str(s);
        true
    }

    /// Remove the last character.
    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.text.is_empty();
        self.text.clear();
        changed
    }

    /// Replace the whole text. Rejected if too long.
    pub fn set(&mut self, text: &str) -> bool {
        if text.chars().count() > self.max_chars {
            return false;
        }
        self.text = text.to_string();
        true
    }

    /// Apply a text-editing command. Returns true if the text changed.
    ///
    /// Non-editing commands are ignored.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::Insert(s) => self.insert(s),
            Command::NewLine => self.insert("\n"),
            Command::Backspace => self.backspace(),
            Command::Clear => self.clear(),
            _ => false,
        }
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}
