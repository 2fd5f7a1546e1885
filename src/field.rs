// Copyright (c) 2026 rezky_nightky

use rand::{rngs::StdRng, Rng};
use tracing::{debug, trace};

use crate::config::RainConfig;
use crate::error::{FieldError, LaneError};
use crate::glyph::{Alphabet, GlyphSource};
use crate::lanes::LaneAllocator;
use crate::raindrop::Raindrop;
use crate::render::Surface;
use crate::shade::{color_for, Rgba, BACKGROUND};

/// One glyph of the current frame, ready for a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphDraw {
    pub x: i32,
    pub y: i32,
    pub glyph: char,
    pub color: Rgba,
}

/// The fixed pool of raindrops plus everything they share: lane occupancy,
/// the glyph source and a single random generator.
pub struct RainField {
    config: RainConfig,
    drops: Vec<Raindrop>,
    lanes: Option<LaneAllocator>,
    lane_count: usize,
    glyphs: GlyphSource,
    rng: StdRng,
    frames: u64,
    recycles: u64,
}

/// Picks a lane for `drop` and gives it a fresh tail at the top.
fn place<R: Rng>(
    drop: &mut Raindrop,
    lanes: Option<&mut LaneAllocator>,
    lane_count: usize,
    cell: i32,
    glyphs: &GlyphSource,
    rng: &mut R,
) -> Result<(), LaneError> {
    let x = match lanes {
        Some(lanes) => {
            let x = lanes.allocate(rng)?;
            debug_assert!(!lanes.is_free(x));
            x
        }
        None => rng.random_range(0..lane_count) as i32 * cell,
    };
    drop.reset(x, glyphs, rng);
    Ok(())
}

impl RainField {
    /// Builds and seeds the pool. Exclusive-lane configs get one raindrop
    /// per lane whatever `max_raindrops` says.
    pub fn new(mut config: RainConfig, alphabet: Alphabet, rng: StdRng) -> Result<Self, FieldError> {
        config.force_lane_pool();
        config.validate()?;
        let glyphs = GlyphSource::new(alphabet, config.max_tail_length)?;
        let lane_count = config.lane_count();
        let lanes = (!config.overlap_allowed)
            .then(|| LaneAllocator::new(config.screen_width, config.cell_size));

        let mut field = Self {
            config,
            drops: (0..config.max_raindrops)
                .map(|_| Raindrop::with_capacity(config.max_tail_length))
                .collect(),
            lanes,
            lane_count,
            glyphs,
            rng,
            frames: 0,
            recycles: 0,
        };

        for drop in &mut field.drops {
            place(
                drop,
                field.lanes.as_mut(),
                field.lane_count,
                field.config.cell_size,
                &field.glyphs,
                &mut field.rng,
            )?;
        }

        debug!(
            raindrops = field.drops.len(),
            lanes = field.lane_count,
            exclusive = field.lanes.is_some(),
            width = field.config.screen_width,
            height = field.config.screen_height,
            "rain field ready"
        );
        Ok(field)
    }

    pub fn config(&self) -> &RainConfig {
        &self.config
    }

    pub fn alphabet(&self) -> Alphabet {
        self.glyphs.alphabet()
    }

    pub fn raindrops(&self) -> &[Raindrop] {
        &self.drops
    }

    pub fn lanes(&self) -> Option<&LaneAllocator> {
        self.lanes.as_ref()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn recycle_count(&self) -> u64 {
        self.recycles
    }

    /// Moves every raindrop down one cell and recycles the ones whose tail
    /// has left the canvas. A recycled drop gives its lane back before it
    /// asks for a new one, so a full pool always finds a free lane.
    pub fn advance_frame(&mut self) -> Result<(), LaneError> {
        let cell = self.config.cell_size;
        let height = self.config.screen_height;

        for (slot, drop) in self.drops.iter_mut().enumerate() {
            drop.fall(cell);
            if !drop.has_exited(height, cell) {
                continue;
            }

            let old_x = drop.x;
            if let Some(lanes) = self.lanes.as_mut() {
                lanes.release(old_x);
            }
            place(
                drop,
                self.lanes.as_mut(),
                self.lane_count,
                cell,
                &self.glyphs,
                &mut self.rng,
            )?;
            self.recycles += 1;
            trace!(slot, old_x, x = drop.x, tail = drop.tail_len(), "recycled");
        }

        self.frames += 1;
        Ok(())
    }

    /// Every glyph of the current frame, leading glyph of each drop first.
    pub fn glyphs(&self) -> impl Iterator<Item = GlyphDraw> + '_ {
        let cell = self.config.cell_size;
        let ratio = self.config.color_ratio;
        self.drops.iter().flat_map(move |d| {
            let len = d.tail_len();
            (0..len).map(move |i| GlyphDraw {
                x: d.x,
                y: d.row_y(i, cell),
                glyph: d.glyph_at(i, cell),
                color: color_for(i, len, ratio),
            })
        })
    }

    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface.clear(BACKGROUND);
        for g in self.glyphs() {
            surface.draw_glyph(g.x, g.y, g.glyph, g.color);
        }
    }
}
