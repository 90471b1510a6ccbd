//! Objective functions scoring decoded land-use grids.
//!
//! All objectives are pure reductions over a single grid; population-wide
//! evaluation runs them in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{ClassCode, NeighborMode, ObjectiveConfig, StaticClassSet};

use super::{Grid, GridError, PatchLabeler, Shape, YieldMap, label_patches};

/// Potential yield maps for the four crops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldMaps {
    pub sugarcane: YieldMap,
    pub soy: YieldMap,
    pub cotton: YieldMap,
    pub pasture: YieldMap,
}

impl YieldMaps {
    /// Every map filled with the same potential yield.
    pub fn uniform(rows: usize, cols: usize, value: f64) -> Self {
        let map = YieldMap::filled(rows, cols, value);
        Self {
            sugarcane: map.clone(),
            soy: map.clone(),
            cotton: map.clone(),
            pasture: map,
        }
    }

    fn named(&self) -> [(&'static str, &YieldMap); 4] {
        [
            ("sugarcane yield map", &self.sugarcane),
            ("soy yield map", &self.soy),
            ("cotton yield map", &self.cotton),
            ("pasture yield map", &self.pasture),
        ]
    }

    /// Shape shared by all four maps.
    pub fn shape(&self) -> Result<Shape, GridError> {
        let shape = self.sugarcane.shape();
        for (name, map) in self.named() {
            self.sugarcane.ensure_shape(name, map.shape())?;
        }
        Ok(shape)
    }
}

/// Objective values of one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveVector {
    /// Total agricultural yield (tonnes).
    pub total_yield: f64,
    /// Total above-ground biomass (tonnes).
    pub total_biomass: f64,
    /// Patch count, when configured.
    pub patch_count: Option<usize>,
}

impl ObjectiveVector {
    /// Values for a minimizer: yield and biomass negated, patch count as is.
    pub fn to_minimization(&self) -> Vec<f64> {
        let mut values = vec![-self.total_yield, -self.total_biomass];
        if let Some(count) = self.patch_count {
            values.push(count as f64);
        }
        values
    }
}

/// Sum potential yield times cell area over cells of `yield_class`, for each
/// of the four yield maps.
pub fn total_yield(
    grid: &Grid,
    yield_maps: &YieldMaps,
    yield_class: ClassCode,
    cell_area: f64,
) -> Result<f64, GridError> {
    let mut total = 0.0;
    for (name, map) in yield_maps.named() {
        grid.ensure_shape(name, map.shape())?;
        total += grid
            .data()
            .iter()
            .zip(map.data())
            .filter(|&(&class, _)| class == yield_class)
            .map(|(_, &potential)| potential * cell_area)
            .sum::<f64>();
    }
    Ok(total)
}

/// Sum of per-class area times per-class biomass density.
pub fn total_biomass(grid: &Grid, densities: &[f64; 256], cell_area: f64) -> f64 {
    let mut counts = [0usize; 256];
    for &class in grid.data() {
        counts[class as usize] += 1;
    }
    counts
        .iter()
        .zip(densities)
        .filter(|&(&count, _)| count > 0)
        .map(|(&count, &density)| count as f64 * cell_area * density)
        .sum()
}

/// Number of patches, a proxy for fragmentation.
pub fn patch_count(
    grid: &Grid,
    static_classes: StaticClassSet,
    no_data_value: ClassCode,
    neighbor_mode: NeighborMode,
) -> usize {
    label_patches(grid, static_classes, no_data_value, neighbor_mode).patch_count()
}

/// Computes objective vectors for grids of one fixed shape.
#[derive(Debug, Clone)]
pub struct ObjectiveEvaluator {
    labeler: PatchLabeler,
    yield_maps: YieldMaps,
    yield_class: ClassCode,
    cell_area: f64,
    biomass: [f64; 256],
    include_patch_count: bool,
}

impl ObjectiveEvaluator {
    /// Fails if the four yield maps disagree on shape.
    pub fn new(
        labeler: PatchLabeler,
        config: &ObjectiveConfig,
        yield_maps: YieldMaps,
    ) -> Result<Self, GridError> {
        yield_maps.shape()?;
        Ok(Self {
            labeler,
            yield_maps,
            yield_class: config.yield_class,
            cell_area: config.cell_area,
            biomass: config.biomass.to_lookup(),
            include_patch_count: config.include_patch_count,
        })
    }

    pub fn total_yield(&self, grid: &Grid) -> Result<f64, GridError> {
        total_yield(grid, &self.yield_maps, self.yield_class, self.cell_area)
    }

    pub fn total_biomass(&self, grid: &Grid) -> f64 {
        total_biomass(grid, &self.biomass, self.cell_area)
    }

    pub fn patch_count(&self, grid: &Grid) -> usize {
        self.labeler.patch_count(grid)
    }

    /// All configured objectives for one grid.
    pub fn evaluate(&self, grid: &Grid) -> Result<ObjectiveVector, GridError> {
        Ok(ObjectiveVector {
            total_yield: self.total_yield(grid)?,
            total_biomass: self.total_biomass(grid),
            patch_count: self.include_patch_count.then(|| self.patch_count(grid)),
        })
    }

    /// Evaluate every grid in parallel, preserving order.
    pub fn evaluate_population(&self, grids: &[Grid]) -> Result<Vec<ObjectiveVector>, GridError> {
        grids.par_iter().map(|grid| self.evaluate(grid)).collect()
    }
}
