//! Row-major raster containers for land-use maps, patch maps and yield maps.

use serde::{Deserialize, Serialize};

use crate::schema::ClassCode;

/// Grid dimensions as `(rows, cols)`.
pub type Shape = (usize, usize);

/// Errors raised by grid-shaped operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("{operand} has shape {found:?}, expected {expected:?}")]
    DimensionMismatch {
        operand: &'static str,
        expected: Shape,
        found: Shape,
    },
    #[error("Raster of shape {shape:?} needs {expected} cells, got {found}")]
    CellCount {
        shape: Shape,
        expected: usize,
        found: usize,
    },
    #[error("Raster shape {rows}x{cols} overflows the addressable cell count")]
    ShapeOverflow { rows: usize, cols: usize },
    #[error("Genome has {found} genes but the patch map has {expected} patches")]
    GenomeLength { expected: usize, found: usize },
    #[error("Round trip changed cell ({row}, {col}): expected {expected}, decoded {found}")]
    InvariantViolation {
        row: usize,
        col: usize,
        expected: ClassCode,
        found: ClassCode,
    },
}

/// Dense row-major 2D raster.
///
/// Indexing is `row * cols + col`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RasterData<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct Raster<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Categorical land-use map, one class code per cell.
pub type Grid = Raster<ClassCode>;

/// Potential yield per cell (tonnes per hectare).
pub type YieldMap = Raster<f64>;

#[derive(Deserialize)]
struct RasterData<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RasterData<T>> for Raster<T> {
    type Error = GridError;

    fn try_from(raw: RasterData<T>) -> Result<Self, Self::Error> {
        Raster::new(raw.rows, raw.cols, raw.data)
    }
}

impl<T> Raster<T> {
    /// Wrap a row-major buffer, checking its length.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, GridError> {
        let expected = cell_count(rows, cols)?;
        if data.len() != expected {
            return Err(GridError::CellCount {
                shape: (rows, cols),
                expected,
                found: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let data: Vec<T> = rows.into_iter().flatten().collect();
        Self::new(height, width, data)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        (self.rows, self.cols)
    }

    /// Total cell count.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(row, col)`.
    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    /// Row-major cell buffer.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Fail with [`GridError::DimensionMismatch`] unless `other` has this raster's shape.
    pub fn ensure_shape(&self, operand: &'static str, other: Shape) -> Result<(), GridError> {
        if self.shape() == other {
            Ok(())
        } else {
            Err(GridError::DimensionMismatch {
                operand,
                expected: self.shape(),
                found: other,
            })
        }
    }
}

impl<T: Copy> Raster<T> {
    /// Raster with every cell set to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`, as `vec!` does for an
    /// oversized allocation. Use [`Raster::new`] for untrusted shapes.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        let len = cell_count(rows, cols)
            .unwrap_or_else(|e| panic!("{e}"));
        Self {
            rows,
            cols,
            data: vec![value; len],
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let i = self.idx(row, col);
        self.data[i] = value;
    }
}

/// Number of cells in a `rows x cols` raster, or an error if it overflows.
fn cell_count(rows: usize, cols: usize) -> Result<usize, GridError> {
    rows.checked_mul(cols)
        .ok_or(GridError::ShapeOverflow { rows, cols })
}

/// Patch identifier per cell. Zero marks static or no-data cells.
///
/// Identifiers run from 1 to [`PatchMap::patch_count`] in row-major
/// discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMap {
    rows: usize,
    cols: usize,
    ids: Vec<u32>,
    patch_count: usize,
}

impl PatchMap {
    pub(crate) fn from_parts(rows: usize, cols: usize, ids: Vec<u32>, patch_count: usize) -> Self {
        debug_assert_eq!(ids.len(), rows * cols);
        Self {
            rows,
            cols,
            ids,
            patch_count,
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        (self.rows, self.cols)
    }

    /// Number of patches, equal to the largest identifier.
    #[inline]
    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.ids[row * self.cols + col]
    }

    /// Row-major identifier buffer.
    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Nested-row view, handy for assertions.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.ids.chunks(self.cols.max(1)).map(<[u32]>::to_vec).collect()
    }
}
