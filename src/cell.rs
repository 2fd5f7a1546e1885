// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// Marks the right half of a wide glyph; the terminal skips it when printing.
pub const CONTINUATION: char = '\0';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank_with_bg(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }

    pub fn continuation(bg: Option<Color>) -> Self {
        Self {
            ch: CONTINUATION,
            fg: None,
            bg,
            bold: false,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.ch == CONTINUATION
    }
}
