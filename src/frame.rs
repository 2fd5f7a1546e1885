// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;

/// Character grid the rain is painted into each frame, with change tracking
/// so the terminal only rewrites cells that differ.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    blank: Cell,
    painted: Vec<usize>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        let blank = Cell::blank_with_bg(bg);
        Self {
            width,
            height,
            cells: vec![blank; len],
            blank,
            painted: Vec::new(),
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    /// Blanks everything painted since the last clear. A new background
    /// repaints the whole grid.
    pub fn clear(&mut self, bg: Option<Color>) {
        if bg != self.blank.bg {
            self.blank = Cell::blank_with_bg(bg);
            self.cells.fill(self.blank);
            self.painted.clear();
            self.dirty_all = true;
            self.dirty.clear();
            return;
        }

        let mut painted = std::mem::take(&mut self.painted);
        let blank = self.blank;
        for &i in &painted {
            self.set_index(i, blank);
        }
        painted.clear();
        self.painted = painted;
    }

    pub fn background(&self) -> Option<Color> {
        self.blank.bg
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(self.blank)
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.set_index(i, cell);
        }
    }

    fn set_index(&mut self, i: usize, cell: Cell) {
        if cell != self.blank {
            self.painted.push(i);
        }
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    /// Writes a glyph `columns` cells wide starting at `(x, y)`. Glyphs that
    /// would hang off the right edge are dropped.
    pub fn put_glyph(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        fg: Option<Color>,
        bold: bool,
        columns: u16,
    ) {
        let columns = columns.max(1);
        if y >= self.height || x as u32 + columns as u32 > self.width as u32 {
            return;
        }
        let bg = self.blank.bg;
        self.set(x, y, Cell { ch, fg, bg, bold });
        for k in 1..columns {
            self.set(x + k, y, Cell::continuation(bg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(ch: char) -> Cell {
        Cell {
            ch,
            fg: Some(Color::Green),
            bg: None,
            bold: false,
        }
    }

    #[test]
    fn clear_blanks_only_painted_cells() {
        let mut f = Frame::new(4, 2, None);
        f.clear_dirty();
        f.set(1, 1, glyph('x'));
        assert_eq!(f.dirty_indices(), &[5]);
        f.clear_dirty();

        f.clear(None);
        assert_eq!(f.get(1, 1).unwrap().ch, ' ');
        assert_eq!(f.dirty_indices(), &[5]);
        assert!(!f.is_dirty_all());
    }

    #[test]
    fn repainting_the_same_cell_is_not_a_change() {
        let mut f = Frame::new(4, 2, None);
        f.set(0, 0, glyph('x'));
        f.clear_dirty();

        f.clear(None);
        f.set(0, 0, glyph('x'));
        assert_eq!(f.get(0, 0).unwrap().ch, 'x');
        // dirtied by the clear; the terminal compares against what it printed
        assert_eq!(f.dirty_indices(), &[0]);
    }

    #[test]
    fn new_background_repaints_everything() {
        let mut f = Frame::new(2, 2, None);
        f.clear_dirty();
        f.clear(Some(Color::Black));
        assert!(f.is_dirty_all());
        assert_eq!(f.background(), Some(Color::Black));
        assert_eq!(f.get(1, 1).unwrap().bg, Some(Color::Black));
    }

    #[test]
    fn wide_glyph_claims_a_continuation_cell() {
        let mut f = Frame::new(4, 1, None);
        f.put_glyph(2, 0, 'ア', None, true, 2);
        assert_eq!(f.get(2, 0).unwrap().ch, 'ア');
        assert!(f.get(3, 0).unwrap().is_continuation());

        f.put_glyph(3, 0, 'イ', None, true, 2);
        assert!(f.get(3, 0).unwrap().is_continuation());

        f.clear(None);
        assert_eq!(f.get(2, 0).unwrap().ch, ' ');
        assert_eq!(f.get(3, 0).unwrap().ch, ' ');
    }
}
