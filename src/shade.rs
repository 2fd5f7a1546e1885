// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::ColorMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Pre-multiplies alpha for surfaces that cannot blend: `c * a / 255`.
    pub fn over_black(self) -> (u8, u8, u8) {
        let scale = |c: u8| ((c as u16 * self.a as u16) / 255) as u8;
        (scale(self.r), scale(self.g), scale(self.b))
    }
}

pub const BACKGROUND: Rgba = Rgba::opaque(0, 0, 0);

const LEAD: Rgba = Rgba::opaque(200, 255, 200);
const LEAD_DARK: Rgba = Rgba::opaque(25, 50, 25);

/// Color of tail row `row` (0 is the leading glyph) for a tail of `tail_len`
/// glyphs. Tails shorter than `ratio` use the darker palette.
pub fn color_for(row: usize, tail_len: usize, ratio: usize) -> Rgba {
    let short = tail_len < ratio;
    if row == 0 {
        return if short { LEAD_DARK } else { LEAD };
    }

    let len = tail_len.max(1) as i64;
    let back = row as i64 - len;
    let fade = (back * 255 / len).unsigned_abs().min(255) as u8;
    let dim = (back * 100 / len).unsigned_abs().min(255) as u8;

    if short {
        Rgba::new(0, 50, 0, fade)
    } else {
        Rgba::new(dim, fade, dim, fade)
    }
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |c: u8| ((c as u16 * 5) + 127) / 255;
    let (r6, g6, b6) = (level(r), level(g), level(b));
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(
        r,
        g,
        b,
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = if avg < 8 {
        (16, 0)
    } else if avg > 238 {
        (231, 255)
    } else {
        let step = (avg - 8) / 10;
        (232 + step, 8 + 10 * step)
    };
    if dist2(r, g, b, gray, gray, gray) < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, (cr, cg, cb))| dist2(r, g, b, *cr, *cg, *cb))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

/// Terminal foreground for an already composited color. Mono terminals get
/// no color at all.
pub fn term_color((r, g, b): (u8, u8, u8), mode: ColorMode) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
        ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
    }
}

/// Terminal background; `None` keeps the terminal's own background.
pub fn term_background(color: Rgba, mode: ColorMode, default_background: bool) -> Option<Color> {
    if default_background {
        return None;
    }
    match mode {
        ColorMode::Mono => None,
        ColorMode::Color16 => Some(rgb_to_color16(color.r, color.g, color.b)),
        ColorMode::TrueColor => Some(Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(color.r, color.g, color.b))),
    }
}
