//! Uniform spatial grid over the placement rectangle.
//!
//! Each cell stores the indices of the buildings whose bounding box touches
//! it, plus the union of those bounding boxes. The union's Z range starts at
//! `pos_range.min.z` so even empty cells have a valid box.

use engine_core::{Aabb, Vec3};

/// Cells per side.
pub const GRID_SIZE: usize = 32;

/// One grid cell: the buildings that touch it and their combined bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    /// Building indices, in insertion order.
    pub members: Vec<usize>,
    /// Union of the member bounding boxes, seeded with the cell's own footprint.
    pub bcube: Aabb,
}

impl GridCell {
    /// True if no building was inserted into this cell.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Inclusive rectangle of cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// Lowest `[x, y]` cell.
    pub lo: [usize; 2],
    /// Highest `[x, y]` cell, included.
    pub hi: [usize; 2],
}

impl CellRange {
    /// Row-major `(x, y)` iteration over the range.
    pub fn cells(self) -> impl Iterator<Item = (usize, usize)> {
        (self.lo[1]..=self.hi[1]).flat_map(move |y| (self.lo[0]..=self.hi[0]).map(move |x| (x, y)))
    }

    /// Number of cells in the range (never zero).
    pub fn len(&self) -> usize {
        (self.hi[0] - self.lo[0] + 1) * (self.hi[1] - self.lo[1] + 1)
    }
}

/// Broad-phase index for placement and collision queries.
///
/// Cells are stored row-major; positions outside `range` clamp to the edge
/// cells, so every building lands somewhere.
#[derive(Debug, Clone)]
pub struct PlacementGrid {
    /// Area covered by the grid. Only X/Y and `min.z` matter.
    range: Aabb,
    /// Cells per side.
    size: usize,
    cells: Vec<GridCell>,
}

impl PlacementGrid {
    /// A [`GRID_SIZE`] x [`GRID_SIZE`] grid over `range`.
    pub fn new(range: Aabb) -> Self {
        Self::with_size(range, GRID_SIZE)
    }

    /// A `size` x `size` grid; `size` must be at least 1.
    pub fn with_size(range: Aabb, size: usize) -> Self {
        assert!(size >= 1, "grid needs at least one cell per side");
        let mut grid = Self {
            range,
            size,
            cells: Vec::with_capacity(size * size),
        };
        grid.clear();
        grid
    }

    /// Cells per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Remove all members and reset each cell's box to its own footprint.
    pub fn clear(&mut self) {
        let (r, n) = (self.range, self.size);
        let step = (r.size() / n as f32).truncate();
        self.cells.clear();
        for y in 0..n {
            for x in 0..n {
                let lo = Vec3::new(
                    r.min.x + x as f32 * step.x,
                    r.min.y + y as f32 * step.y,
                    r.min.z,
                );
                let hi = Vec3::new(lo.x + step.x, lo.y + step.y, r.min.z);
                self.cells.push(GridCell {
                    members: Vec::new(),
                    bcube: Aabb::new(lo, hi),
                });
            }
        }
    }

    /// Cell coordinate along one axis; positions outside the range clamp to the edge cells.
    fn axis_cell(&self, v: f32, dim: usize) -> usize {
        let (lo, hi) = self.range.axis(dim);
        let span = hi - lo;
        if span <= 0.0 {
            return 0;
        }
        let t = ((v - lo) / span).clamp(0.0, 1.0);
        ((t * (self.size - 1) as f32) as usize).min(self.size - 1)
    }

    /// Cell containing `p` in XY, clamped to the grid.
    pub fn cell_of(&self, p: Vec3) -> (usize, usize) {
        (self.axis_cell(p.x, 0), self.axis_cell(p.y, 1))
    }

    /// Cells covered by the XY extent of `bc`.
    pub fn cell_range_of(&self, bc: &Aabb) -> CellRange {
        let (x1, y1) = self.cell_of(bc.min);
        let (x2, y2) = self.cell_of(bc.max);
        CellRange {
            lo: [x1, y1],
            hi: [x2, y2],
        }
    }

    /// Register building `ix` with every cell its bounding box covers.
    pub fn insert(&mut self, ix: usize, bcube: &Aabb) {
        for (x, y) in self.cell_range_of(bcube).cells() {
            let cell = self.cell_mut(x, y);
            cell.members.push(ix);
            cell.bcube.union_with(bcube);
        }
    }

    /// Cell at `(x, y)`. Panics if either coordinate is outside the grid.
    pub fn cell(&self, x: usize, y: usize) -> &GridCell {
        &self.cells[y * self.size + x]
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> &mut GridCell {
        &mut self.cells[y * self.size + x]
    }

    /// Cells covered by the XY extent of `bc`, row-major, with their `(x, y)`
    /// coordinates. Empty cells are included; callers filter them.
    pub fn cells_in(&self, bc: &Aabb) -> impl Iterator<Item = ((usize, usize), &GridCell)> + '_ {
        self.cell_range_of(bc)
            .cells()
            .map(move |(x, y)| ((x, y), self.cell(x, y)))
    }

    /// Extend every non-empty cell's box down to `z` (used after buildings are lowered).
    pub fn lower_floor(&mut self, z: f32) {
        for cell in self.cells.iter_mut().filter(|c| !c.is_empty()) {
            cell.bcube.min.z = cell.bcube.min.z.min(z);
        }
    }

    /// Every cell, row-major.
    pub fn iter(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }
}
