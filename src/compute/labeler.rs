//! Connected-component labeling of land-use grids into patches.
//!
//! A patch is a maximal set of same-class, non-static cells connected under
//! the configured [`NeighborMode`]. Patches are grown from an explicit
//! frontier stack over linear cell offsets, so grid size is bounded only by
//! memory, not by call depth.

use crate::schema::{ClassCode, LabelingConfig, NeighborMode, StaticClassSet};

use super::{Grid, PatchMap, Shape};

const FOUR_NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const EIGHT_NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Row/column offsets of the neighbourhood.
#[inline]
pub fn neighbor_offsets(mode: NeighborMode) -> &'static [(isize, isize)] {
    match mode {
        NeighborMode::Four => &FOUR_NEIGHBORS,
        NeighborMode::Eight => &EIGHT_NEIGHBORS,
    }
}

/// In-bounds neighbours of `(row, col)`. No wrapping at the edges.
#[inline]
pub fn neighbors(
    row: usize,
    col: usize,
    shape: Shape,
    mode: NeighborMode,
) -> impl Iterator<Item = (usize, usize)> {
    let (rows, cols) = shape;
    neighbor_offsets(mode).iter().filter_map(move |&(dr, dc)| {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < rows && c < cols).then_some((r, c))
    })
}

/// Partitions grids into patches according to a [`LabelingConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PatchLabeler {
    config: LabelingConfig,
}

impl PatchLabeler {
    pub fn new(config: LabelingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LabelingConfig {
        &self.config
    }

    /// Whether a cell of this class can seed or join a patch.
    #[inline]
    pub fn is_labelable(&self, class: ClassCode) -> bool {
        !self.config.is_reserved(class)
    }

    /// Label every patch of `grid` in row-major discovery order.
    pub fn label(&self, grid: &Grid) -> PatchMap {
        let shape = grid.shape();
        let (rows, cols) = shape;
        let cells = grid.data();
        let mode = self.config.neighbor_mode;

        let mut ids = vec![0u32; cells.len()];
        let mut frontier: Vec<usize> = Vec::new();
        let mut patch_count = 0usize;

        for origin in 0..cells.len() {
            let class = cells[origin];
            if ids[origin] != 0 || !self.is_labelable(class) {
                continue;
            }

            patch_count += 1;
            let id = patch_count as u32;
            ids[origin] = id;
            frontier.push(origin);

            // Cells are marked when pushed, so each enters the frontier once.
            while let Some(cell) = frontier.pop() {
                for (r, c) in neighbors(cell / cols, cell % cols, shape, mode) {
                    let n = r * cols + c;
                    if ids[n] == 0 && cells[n] == class {
                        ids[n] = id;
                        frontier.push(n);
                    }
                }
            }
        }

        log::trace!(
            "labeled {}x{} grid into {} patches ({:?} connectivity)",
            rows,
            cols,
            patch_count,
            mode
        );

        PatchMap::from_parts(rows, cols, ids, patch_count)
    }

    /// Number of patches in `grid`.
    pub fn patch_count(&self, grid: &Grid) -> usize {
        self.label(grid).patch_count()
    }
}

/// Label `grid` without building a [`PatchLabeler`] first.
pub fn label_patches(
    grid: &Grid,
    static_classes: StaticClassSet,
    no_data_value: ClassCode,
    neighbor_mode: NeighborMode,
) -> PatchMap {
    PatchLabeler::new(LabelingConfig {
        static_classes,
        no_data_value,
        neighbor_mode,
    })
    .label(grid)
}
