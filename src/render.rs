// Copyright (c) 2026 rezky_nightky

use crate::frame::Frame;
use crate::runtime::ColorMode;
use crate::shade::{term_background, term_color, Rgba};

/// Anything the rain can be painted on. Coordinates are canvas pixels and
/// `y` is the glyph baseline.
pub trait Surface {
    fn clear(&mut self, color: Rgba);
    fn draw_glyph(&mut self, x: i32, y: i32, glyph: char, color: Rgba);
}

/// Glyphs this faint are skipped on mono terminals, where every drawn glyph
/// would otherwise show at full brightness.
const MONO_MIN_ALPHA: u8 = 96;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellStyle {
    pub cell_size: i32,
    pub glyph_columns: u16,
    pub color_mode: ColorMode,
    pub default_background: bool,
    pub bold: bool,
}

/// Maps pixel coordinates onto a character [`Frame`]: lane `x / cell_size`
/// becomes column `lane * glyph_columns`, baseline `y` becomes row
/// `y / cell_size - 1`.
pub struct CellSurface<'a> {
    frame: &'a mut Frame,
    style: CellStyle,
}

impl<'a> CellSurface<'a> {
    pub fn new(frame: &'a mut Frame, style: CellStyle) -> Self {
        Self { frame, style }
    }

    fn cell_of(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        let cell = self.style.cell_size.max(1);
        if x < 0 || y < cell {
            return None;
        }
        let col = i64::from(x / cell) * i64::from(self.style.glyph_columns.max(1));
        let row = y / cell - 1;
        Some((u16::try_from(col).ok()?, u16::try_from(row).ok()?))
    }
}

impl Surface for CellSurface<'_> {
    fn clear(&mut self, color: Rgba) {
        let bg = term_background(color, self.style.color_mode, self.style.default_background);
        self.frame.clear(bg);
    }

    fn draw_glyph(&mut self, x: i32, y: i32, glyph: char, color: Rgba) {
        let Some((col, row)) = self.cell_of(x, y) else {
            return;
        };
        if self.style.color_mode == ColorMode::Mono && color.a < MONO_MIN_ALPHA {
            return;
        }
        let fg = term_color(color.over_black(), self.style.color_mode);
        self.frame
            .put_glyph(col, row, glyph, fg, self.style.bold, self.style.glyph_columns);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::style::Color;

    use super::*;

    fn style(columns: u16, mode: ColorMode) -> CellStyle {
        CellStyle {
            cell_size: 14,
            glyph_columns: columns,
            color_mode: mode,
            default_background: false,
            bold: false,
        }
    }

    #[test]
    fn baseline_maps_to_the_row_above() {
        let mut f = Frame::new(10, 5, None);
        let mut s = CellSurface::new(&mut f, style(1, ColorMode::TrueColor));
        s.draw_glyph(28, 14, 'a', Rgba::opaque(0, 255, 0));
        s.draw_glyph(0, 70, 'b', Rgba::opaque(0, 255, 0));
        s.draw_glyph(0, 13, 'c', Rgba::opaque(0, 255, 0));
        s.draw_glyph(0, 84, 'd', Rgba::opaque(0, 255, 0));
        assert_eq!(f.get(2, 0).unwrap().ch, 'a');
        assert_eq!(f.get(0, 4).unwrap().ch, 'b');
        assert!((0..5).all(|r| f.get(0, r).unwrap().ch != 'c'));
        assert!((0..5).all(|r| f.get(0, r).unwrap().ch != 'd'));
    }

    #[test]
    fn wide_alphabets_double_the_column() {
        let mut f = Frame::new(10, 2, None);
        let mut s = CellSurface::new(&mut f, style(2, ColorMode::TrueColor));
        s.draw_glyph(42, 14, 'ア', Rgba::opaque(200, 255, 200));
        assert_eq!(f.get(6, 0).unwrap().ch, 'ア');
        assert!(f.get(7, 0).unwrap().is_continuation());
    }

    #[test]
    fn colors_are_composited_against_black() {
        let mut f = Frame::new(4, 2, None);
        let mut s = CellSurface::new(&mut f, style(1, ColorMode::TrueColor));
        s.draw_glyph(0, 14, 'a', Rgba::new(100, 200, 100, 51));
        assert_eq!(
            f.get(0, 0).unwrap().fg,
            Some(Color::Rgb { r: 20, g: 40, b: 20 })
        );
    }

    #[test]
    fn mono_drops_faint_glyphs() {
        let mut f = Frame::new(4, 2, None);
        let mut s = CellSurface::new(&mut f, style(1, ColorMode::Mono));
        s.draw_glyph(0, 14, 'a', Rgba::new(0, 50, 0, 20));
        s.draw_glyph(14, 14, 'b', Rgba::opaque(200, 255, 200));
        assert_eq!(f.get(0, 0).unwrap().ch, ' ');
        assert_eq!(f.get(1, 0).unwrap().ch, 'b');
        assert_eq!(f.get(1, 0).unwrap().fg, None);
    }

    #[test]
    fn clear_sets_the_background() {
        let mut f = Frame::new(2, 2, None);
        let mut s = CellSurface::new(&mut f, style(1, ColorMode::TrueColor));
        s.clear(Rgba::opaque(0, 0, 0));
        assert_eq!(f.background(), Some(Color::Rgb { r: 0, g: 0, b: 0 }));
    }
}
