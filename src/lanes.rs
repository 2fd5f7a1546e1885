// Copyright (c) 2026 rezky_nightky

use rand::Rng;

use crate::error::LaneError;

/// Number of whole cells that fit across the canvas.
pub fn lane_count(canvas_width: i32, cell_width: i32) -> usize {
    if canvas_width <= 0 || cell_width <= 0 {
        return 0;
    }
    (canvas_width / cell_width) as usize
}

/// Free-set of lane coordinates for rain that must not overlap.
///
/// `free` holds the unoccupied lanes in arbitrary order and `slot[k]` is the
/// position of lane `k` inside `free` (or `None` while a raindrop holds it), so
/// both allocation and release are O(1).
#[derive(Clone, Debug)]
pub struct LaneAllocator {
    cell_width: i32,
    free: Vec<i32>,
    slot: Vec<Option<usize>>,
}

impl LaneAllocator {
    pub fn new(canvas_width: i32, cell_width: i32) -> Self {
        let lanes = lane_count(canvas_width, cell_width);
        Self {
            cell_width,
            free: (0..lanes).map(|k| k as i32 * cell_width).collect(),
            slot: (0..lanes).map(Some).collect(),
        }
    }

    pub fn lane_count(&self) -> usize {
        self.slot.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    fn lane_index(&self, x: i32) -> Option<usize> {
        if x < 0 || self.cell_width <= 0 || x % self.cell_width != 0 {
            return None;
        }
        let k = (x / self.cell_width) as usize;
        (k < self.slot.len()).then_some(k)
    }

    pub fn is_free(&self, x: i32) -> bool {
        self.lane_index(x)
            .and_then(|k| self.slot[k])
            .is_some()
    }

    /// Takes a uniformly random free lane.
    pub fn allocate<R: Rng>(&mut self, rng: &mut R) -> Result<i32, LaneError> {
        if self.free.is_empty() {
            return Err(LaneError::Exhausted {
                lanes: self.lane_count(),
            });
        }
        let pos = rng.random_range(0..self.free.len());
        let x = self.free.swap_remove(pos);
        if let Some(&moved) = self.free.get(pos) {
            if let Some(k) = self.lane_index(moved) {
                self.slot[k] = Some(pos);
            }
        }
        if let Some(k) = self.lane_index(x) {
            self.slot[k] = None;
        }
        Ok(x)
    }

    /// Returns `x` to the free set. Already-free lanes and coordinates that are
    /// not lanes are left alone; the return value says whether anything changed.
    pub fn release(&mut self, x: i32) -> bool {
        let Some(k) = self.lane_index(x) else {
            return false;
        };
        if self.slot[k].is_some() {
            return false;
        }
        self.slot[k] = Some(self.free.len());
        self.free.push(x);
        true
    }
}
