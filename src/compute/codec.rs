//! Patch-level genome encoding and decoding.
//!
//! A genome holds one gene per patch, indexed by patch identifier minus one.
//! It is only meaningful alongside the [`PatchMap`] it was extracted with.

use crate::schema::ClassCode;

use super::{Grid, GridError, PatchLabeler, PatchMap};

/// Ordered genes, one per patch.
///
/// A `None` gene carries no class of its own: decoding takes the cell value
/// from the fallback grid instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Genome {
    genes: Vec<Option<ClassCode>>,
}

impl Genome {
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<ClassCode> {
        self.genes.get(index).copied().flatten()
    }

    #[inline]
    pub fn set(&mut self, index: usize, class: ClassCode) {
        self.genes[index] = Some(class);
    }

    /// Defer this gene to the decode fallback grid.
    #[inline]
    pub fn inherit(&mut self, index: usize) {
        self.genes[index] = None;
    }

    pub fn genes(&self) -> &[Option<ClassCode>] {
        &self.genes
    }
}

impl From<Vec<ClassCode>> for Genome {
    fn from(classes: Vec<ClassCode>) -> Self {
        Self {
            genes: classes.into_iter().map(Some).collect(),
        }
    }
}

/// A grid's patch map together with the genome extracted from it.
#[derive(Debug, Clone)]
pub struct EncodedGrid {
    pub patch_map: PatchMap,
    pub genome: Genome,
}

impl EncodedGrid {
    /// Label `grid` and extract its genome.
    pub fn new(labeler: &PatchLabeler, grid: &Grid) -> Self {
        let patch_map = labeler.label(grid);
        let genome = extract(grid, &patch_map);
        Self { patch_map, genome }
    }

    /// Rebuild a grid from this patch map and `genome`.
    pub fn decode_with(&self, genome: &Genome, fallback: &Grid) -> Result<Grid, GridError> {
        decode(&self.patch_map, genome, fallback)
    }
}

/// Extract one gene per patch, in ascending identifier order.
pub fn encode(grid: &Grid, patch_map: &PatchMap) -> Result<Genome, GridError> {
    grid.ensure_shape("patch map", patch_map.shape())?;
    Ok(extract(grid, patch_map))
}

fn extract(grid: &Grid, patch_map: &PatchMap) -> Genome {
    let mut genes = vec![None; patch_map.patch_count()];
    for (&id, &class) in patch_map.ids().iter().zip(grid.data()) {
        if id != 0 {
            // The first cell of each patch in row-major order is its origin.
            genes[id as usize - 1].get_or_insert(class);
        }
    }
    Genome { genes }
}

/// Rebuild a grid: patch cells take their gene, everything else (static
/// cells and `None` genes) takes the fallback value at the same position.
pub fn decode(patch_map: &PatchMap, genome: &Genome, fallback: &Grid) -> Result<Grid, GridError> {
    fallback.ensure_shape("patch map", patch_map.shape())?;
    if genome.len() < patch_map.patch_count() {
        return Err(GridError::GenomeLength {
            expected: patch_map.patch_count(),
            found: genome.len(),
        });
    }

    let cells: Vec<ClassCode> = patch_map
        .ids()
        .iter()
        .zip(fallback.data())
        .map(|(&id, &original)| match id {
            0 => original,
            id => genome.genes[id as usize - 1].unwrap_or(original),
        })
        .collect();

    Grid::new(fallback.rows(), fallback.cols(), cells)
}

/// Check that encoding then decoding `grid` reproduces it exactly.
pub fn verify_round_trip(grid: &Grid, patch_map: &PatchMap) -> Result<(), GridError> {
    let genome = encode(grid, patch_map)?;
    let decoded = decode(patch_map, &genome, grid)?;

    match grid
        .data()
        .iter()
        .zip(decoded.data())
        .position(|(a, b)| a != b)
    {
        None => Ok(()),
        Some(i) => Err(GridError::InvariantViolation {
            row: i / grid.cols(),
            col: i % grid.cols(),
            expected: grid.data()[i],
            found: decoded.data()[i],
        }),
    }
}
