//! # Machine I/O
//!
//! Input is handed to a run as one flattened string. [`InputCursor`] reads it
//! back one character or one number at a time. Reads return `None` only when
//! the input is exhausted, so a program can tell end of input from a zero.

/// Read cursor over a run's input string
#[derive(Debug, Clone, Default)]
pub struct InputCursor {
    chars: Vec<char>,
    pos: usize,
}

impl InputCursor {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn read_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += 1;
        Some(ch)
    }

    /// Read a signed decimal number.
    ///
    /// Leading whitespace is skipped. A token that does not start a number
    /// consumes one character and reads as 0; only exhaustion returns `None`.
    pub fn read_number(&mut self) -> Option<i64> {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let first = self.peek_char()?;

        let mut negative = false;
        if first == '-' || first == '+' {
            let next = self.chars.get(self.pos + 1).copied();
            if next.is_some_and(|c| c.is_ascii_digit()) {
                negative = first == '-';
                self.pos += 1;
            }
        }

        let mut value: i64 = 0;
        let mut digits = 0;
        while let Some(digit) = self.peek_char().and_then(|c| c.to_digit(10)) {
            value = value.saturating_mul(10).saturating_add(digit as i64);
            digits += 1;
            self.pos += 1;
        }
        if digits == 0 {
            self.pos += 1;
            return Some(0);
        }
        Some(if negative { -value } else { value })
    }

    /// Read up to and including the next newline; the newline is not returned
    pub fn read_line(&mut self) -> Option<String> {
        if self.is_exhausted() {
            return None;
        }
        let mut line = String::new();
        while let Some(ch) = self.read_char() {
            if ch == '\n' {
                break;
            }
            line.push(ch);
        }
        Some(line)
    }
}

/// Accumulated program output, tracking its length in characters
#[derive(Debug, Clone, Default)]
pub struct Output {
    text: String,
    chars: usize,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.chars += 1;
    }

    /// Write a code point, substituting U+FFFD for values that are not
    /// Unicode scalars
    pub fn push_code(&mut self, code: i64) {
        let ch = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        self.push_char(ch);
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
        self.chars += s.chars().count();
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
