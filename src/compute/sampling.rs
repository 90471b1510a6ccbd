//! Initial population sampling around a base land-use map.
//!
//! Each realization keeps most of the base map and reassigns spatially
//! clustered blocks of mutable cells, so the starting population already
//! consists of coherent patches rather than isolated cells.

use rand::Rng;
use rand_distr::Uniform;

use crate::schema::{MutationPolicy, SamplingConfig};

use super::{Grid, PatchLabeler};

/// Generates perturbed copies of a base map.
#[derive(Debug, Clone)]
pub struct SpatialSampler {
    labeler: PatchLabeler,
    change_threshold: f64,
    policy: MutationPolicy,
}

impl SpatialSampler {
    pub fn new(labeler: PatchLabeler, config: &SamplingConfig) -> Self {
        Self {
            labeler,
            change_threshold: config.change_threshold,
            policy: config.policy.policy(),
        }
    }

    /// One realization of `base`.
    ///
    /// A uniform noise field is smoothed with a 3x3 mean (border cells fixed
    /// at 1.0). Mutable cells whose smoothed value falls below the change
    /// threshold get a class drawn from the sampling policy.
    pub fn sample<R: Rng + ?Sized>(&self, base: &Grid, rng: &mut R) -> Grid {
        let smoothed = smoothed_noise(base.rows(), base.cols(), rng);
        let unit = Uniform::new(0.0, 1.0);

        let mut realization = base.clone();
        let mut changed = 0usize;
        for (cell, &weight) in realization.data_mut().iter_mut().zip(&smoothed) {
            if weight >= self.change_threshold || !self.labeler.is_labelable(*cell) {
                continue;
            }
            if let Some(class) = self.policy.sample(rng.sample(unit)) {
                *cell = class;
                changed += 1;
            }
        }

        log::trace!(
            "sampled realization with {} of {} cells reassigned",
            changed,
            base.len()
        );
        realization
    }
}

/// Uniform noise smoothed by a 3x3 moving-window mean; border cells are 1.0.
fn smoothed_noise<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Vec<f64> {
    let unit = Uniform::new(0.0, 1.0);
    let noise: Vec<f64> = (0..rows * cols).map(|_| rng.sample(unit)).collect();

    let mut smoothed = vec![1.0; rows * cols];
    for row in 1..rows.saturating_sub(1) {
        for col in 1..cols.saturating_sub(1) {
            let mut sum = 0.0;
            for r in row - 1..=row + 1 {
                for c in col - 1..=col + 1 {
                    sum += noise[r * cols + c];
                }
            }
            smoothed[row * cols + col] = sum / 9.0;
        }
    }
    smoothed
}
