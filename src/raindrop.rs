// Copyright (c) 2026 rezky_nightky

use rand::Rng;

use crate::glyph::GlyphSource;

/// One falling stream. `x` is the lane and `y` the pixel baseline of the
/// leading glyph; `glyphs` is never empty once the drop has been reset.
#[derive(Clone, Debug)]
pub struct Raindrop {
    pub x: i32,
    pub y: i32,
    pub glyphs: Vec<char>,
}

impl Raindrop {
    pub fn with_capacity(max_tail_length: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            glyphs: Vec::with_capacity(max_tail_length),
        }
    }

    /// Moves the drop back to the top of lane `x` with a new tail.
    pub fn reset<R: Rng + ?Sized>(&mut self, x: i32, source: &GlyphSource, rng: &mut R) {
        self.y = 0;
        self.x = x;
        source.fill_tail(rng, &mut self.glyphs);
    }

    pub fn tail_len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn fall(&mut self, cell_height: i32) {
        self.y += cell_height;
    }

    /// Index into `glyphs` shown at tail row `row`. The offset shifts with
    /// every cell the drop falls, so the tail churns instead of sliding.
    pub fn glyph_index(&self, row: usize, cell_height: i32) -> usize {
        let len = self.glyphs.len().max(1) as i64;
        let step = i64::from(self.y / cell_height.max(1));
        ((row as i64 - step) % len).unsigned_abs() as usize
    }

    pub fn glyph_at(&self, row: usize, cell_height: i32) -> char {
        self.glyphs
            .get(self.glyph_index(row, cell_height))
            .copied()
            .unwrap_or(' ')
    }

    pub fn row_y(&self, row: usize, cell_height: i32) -> i32 {
        (i64::from(self.y) - row as i64 * i64::from(cell_height)) as i32
    }

    /// True once the last tail glyph has scrolled past `canvas_height`.
    pub fn has_exited(&self, canvas_height: i32, cell_height: i32) -> bool {
        let tail = self.glyphs.len() as i64 * i64::from(cell_height);
        i64::from(self.y) - tail >= i64::from(canvas_height)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::glyph::Alphabet;

    fn drop_with(len: usize) -> Raindrop {
        Raindrop {
            x: 0,
            y: 0,
            glyphs: (0..len).map(|i| char::from(b'a' + i as u8)).collect(),
        }
    }

    #[test]
    fn scrolling_index_cycles_through_the_tail() {
        let mut d = drop_with(4);
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(d.glyph_index(0, 14));
            d.fall(14);
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn scrolling_index_matches_absolute_difference() {
        let mut d = drop_with(5);
        d.y = 14 * 7;
        for row in 0..5 {
            let want = (row as i64 - 7).unsigned_abs() as usize % 5;
            assert_eq!(d.glyph_index(row, 14), want);
        }
        assert_eq!(d.glyph_at(2, 14), 'a');
    }

    #[test]
    fn exit_needs_the_whole_tail_below_the_canvas() {
        let mut d = drop_with(5);
        d.y = 756;
        assert!(!d.has_exited(700, 14));
        d.y = 770;
        assert!(d.has_exited(700, 14));
    }

    #[test]
    fn row_y_steps_up_the_tail() {
        let mut d = drop_with(3);
        d.y = 28;
        assert_eq!(d.row_y(0, 14), 28);
        assert_eq!(d.row_y(2, 14), 0);
    }

    #[test]
    fn reset_twice_leaves_no_stale_state() {
        let src = GlyphSource::new(Alphabet::KATAKANA, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut d = Raindrop::with_capacity(10);
        d.y = 500;
        for x in [28, 42] {
            d.reset(x, &src, &mut rng);
            assert_eq!(d.y, 0);
            assert_eq!(d.x, x);
            assert!((1..=10).contains(&d.tail_len()));
            assert!(d.glyphs.iter().all(|&c| Alphabet::KATAKANA.contains(c)));
        }
    }
}
