use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cmp::min;

/// Single-line input shared by the search prompts, the command prompt and the new-session form.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineEditor {
    pub text: String,
    pub cursor_col: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor_col: 0,
        }
    }

    pub fn from_text(text: String) -> Self {
        let cursor_col = text.chars().count();
        Self { text, cursor_col }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_col = 0;
    }

    /// Applies an editing key; `false` when the key is not an editing key.
    ///
    /// Control- and Alt-modified characters are left to the caller.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    && !ch.is_control() =>
            {
                self.insert_char(ch)
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buffer = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buffer));
    }

    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let normalized = normalize_single_line(text);
        if normalized.is_empty() {
            return;
        }

        self.clamp_cursor();
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.insert_str(byte_index, &normalized);
        self.cursor_col += normalized.chars().count();
    }

    pub fn backspace(&mut self) {
        self.clamp_cursor();
        if self.cursor_col == 0 {
            return;
        }

        let remove_col = self.cursor_col - 1;
        let byte_index = char_to_byte_index(&self.text, remove_col);
        self.text.remove(byte_index);
        self.cursor_col -= 1;
    }

    pub fn delete_forward(&mut self) {
        self.clamp_cursor();
        if self.cursor_col >= self.text.chars().count() {
            return;
        }

        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.remove(byte_index);
    }

    pub fn move_left(&mut self) {
        self.clamp_cursor();
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.clamp_cursor();
        self.cursor_col = (self.cursor_col + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.text.chars().count();
    }

    fn clamp_cursor(&mut self) {
        let len = self.text.chars().count();
        self.cursor_col = min(self.cursor_col, len);
    }
}

fn normalize_single_line(text: &str) -> String {
    let mut out = String::new();
    let mut last_was_space = false;

    for ch in text.chars() {
        let ch = match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        };

        if ch == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        out.push(ch);
    }

    out
}

fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }
    match text.char_indices().nth(char_index) {
        Some((idx, _)) => idx,
        None => text.len(),
    }
}
