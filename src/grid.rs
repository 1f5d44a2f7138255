//! Packed bitmap grid used by the dynamic pathfinding engine.

use std::fmt;

/// A linear cell index into a [`Grid`]'s row-major cell array.
pub type CellId = usize;

/// Hard limit on either grid dimension, matching the benchmark harness.
pub const MAX_DIM: u32 = 8000;

/// A grid coordinate. Bounded by the dimensions of whichever [`Grid`] it indexes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Point {
    /// Column, 0-based from the left.
    pub x: u16,
    /// Row, 0-based from the top.
    pub y: u16,
}

impl Point {
    /// Build a point from raw coordinates.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A patch did not fit inside the grid it was applied to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
#[error("patch does not fit within the grid bounds")]
pub struct PatchOutOfBounds;

/// A rectangular bitmap: bit 1 = traversable, bit 0 = blocked.
///
/// Cells are packed row-major, 64 per `u64` word. A [`Grid`] also doubles as patch content: a
/// patch is just a small grid applied at an offset into a larger one (see [`Grid::apply_patch`]).
#[derive(Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl Grid {
    /// Create a `width x height` grid with every cell initialized to `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: bool) -> Self {
        let size = (width as usize) * (height as usize);
        let word_count = size.div_ceil(64);
        let word = if fill { u64::MAX } else { 0 };
        Grid {
            width,
            height,
            words: vec![word; word_count],
        }
    }

    /// The grid's width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The grid's height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells, `width * height`.
    #[must_use]
    pub fn size(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Pack a coordinate into a linear cell id, `i = y * width + x`.
    ///
    /// # Panics
    /// Panics if `p` is out of bounds for this grid.
    #[must_use]
    pub fn pack(&self, p: Point) -> CellId {
        assert!(
            (p.x as u32) < self.width && (p.y as u32) < self.height,
            "point {p} out of bounds for a {}x{} grid",
            self.width,
            self.height
        );
        (p.y as usize) * (self.width as usize) + (p.x as usize)
    }

    /// Unpack a linear cell id back into a coordinate.
    ///
    /// # Panics
    /// Panics if `id` is out of range for this grid.
    #[must_use]
    pub fn unpack(&self, id: CellId) -> Point {
        assert!(id < self.size(), "cell id {id} out of range");
        let w = self.width as usize;
        Point::new((id % w) as u16, (id / w) as u16)
    }

    /// Traversability of the cell at linear id `id`. Out-of-range ids are blocked.
    #[must_use]
    pub fn get(&self, id: CellId) -> bool {
        id < self.size() && (self.words[id / 64] >> (id % 64)) & 1 != 0
    }

    /// Traversability of `(x, y)`, bounds-safe against negative or overflowing coordinates.
    ///
    /// This is the accessor used pervasively during 8-neighbor expansion, where `x - 1` or
    /// `y - 1` may go negative: any out-of-range coordinate is simply blocked.
    #[must_use]
    pub fn get_xy(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.get((y as usize) * (self.width as usize) + (x as usize))
    }

    fn set(&mut self, id: CellId, value: bool) {
        let word = &mut self.words[id / 64];
        let bit = 1u64 << (id % 64);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Overwrite the sub-rectangle described by `patch`, applied with its top-left corner at
    /// `pos`: `self[(pos.y + y) * width + (pos.x + x)] = patch[y * patch.width + x]`.
    ///
    /// # Errors
    /// Returns [`PatchOutOfBounds`] if the patch does not fit entirely within this grid at `pos`.
    pub fn apply_patch(&mut self, pos: Point, patch: &Grid) -> Result<(), PatchOutOfBounds> {
        let (px, py) = (u32::from(pos.x), u32::from(pos.y));
        if px + patch.width > self.width || py + patch.height > self.height {
            return Err(PatchOutOfBounds);
        }
        for y in 0..patch.height {
            for x in 0..patch.width {
                let value = patch.get((y as usize) * (patch.width as usize) + (x as usize));
                let dest = ((py + y) as usize) * (self.width as usize) + ((px + x) as usize);
                self.set(dest, value);
            }
        }
        Ok(())
    }
}
