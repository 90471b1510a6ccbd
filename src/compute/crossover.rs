//! Spatial n-point crossover on patch genomes.
//!
//! Both parents are labeled independently, so their genomes index different
//! patch layouts. Crossover cuts the two gene sequences at shared positions
//! and alternates which child keeps its own parent's genes. A child gene that
//! is handed over is decoded from the other parent's cells at the same
//! positions, which makes this a positional approximation of a region swap.

use rand::Rng;

use crate::schema::CrossoverConfig;

use super::{EncodedGrid, Genome, Grid, GridError, PatchLabeler, verify_round_trip};

/// Recombines pairs of land-use grids patch by patch.
#[derive(Debug, Clone)]
pub struct SpatialCrossover {
    labeler: PatchLabeler,
    num_cut_points: usize,
    verify_round_trip: bool,
}

impl SpatialCrossover {
    pub fn new(labeler: PatchLabeler, config: CrossoverConfig) -> Self {
        Self {
            labeler,
            num_cut_points: config.num_cut_points,
            verify_round_trip: false,
        }
    }

    /// Check every parent's genome round trip before recombining.
    pub fn with_round_trip_check(mut self, enabled: bool) -> Self {
        self.verify_round_trip = enabled;
        self
    }

    /// Produce two children from two parents of equal shape.
    ///
    /// With no usable cut point (either genome shorter than two genes, or
    /// zero cut points configured) the children are copies of the parents.
    pub fn cross<R: Rng + ?Sized>(
        &self,
        parent_a: &Grid,
        parent_b: &Grid,
        rng: &mut R,
    ) -> Result<(Grid, Grid), GridError> {
        parent_a.ensure_shape("second parent", parent_b.shape())?;

        let a = EncodedGrid::new(&self.labeler, parent_a);
        let b = EncodedGrid::new(&self.labeler, parent_b);
        if self.verify_round_trip {
            verify_round_trip(parent_a, &a.patch_map)?;
            verify_round_trip(parent_b, &b.patch_map)?;
        }

        let shared = a.genome.len().min(b.genome.len());
        let cuts = cut_points(self.num_cut_points, shared, rng);
        if cuts.is_empty() {
            log::debug!(
                "crossover skipped: genome lengths {} and {}, {} cut points requested",
                a.genome.len(),
                b.genome.len(),
                self.num_cut_points
            );
            return Ok((parent_a.clone(), parent_b.clone()));
        }

        let (genome_a, genome_b) = recombine(&a.genome, &b.genome, &cuts);
        let child_a = a.decode_with(&genome_a, parent_b)?;
        let child_b = b.decode_with(&genome_b, parent_a)?;
        Ok((child_a, child_b))
    }
}

/// Draw `min(requested, shared - 1)` distinct cut positions from
/// `1..shared`, sorted ascending.
pub fn cut_points<R: Rng + ?Sized>(requested: usize, shared: usize, rng: &mut R) -> Vec<usize> {
    if shared < 2 || requested == 0 {
        return Vec::new();
    }
    let count = requested.min(shared - 1);
    let mut cuts: Vec<usize> = rand::seq::index::sample(rng, shared - 1, count)
        .into_iter()
        .map(|i| i + 1)
        .collect();
    cuts.sort_unstable();
    cuts
}

/// Alternate gene ownership over the shared prefix of two genomes.
///
/// In even segments the first child keeps its genes and the second child's
/// genes defer to its fallback; odd segments swap roles. Genes past the
/// shorter genome are left untouched.
pub fn recombine(a: &Genome, b: &Genome, cuts: &[usize]) -> (Genome, Genome) {
    let mut child_a = a.clone();
    let mut child_b = b.clone();
    let shared = a.len().min(b.len());

    let mut segment = 0;
    for i in 0..shared {
        if segment < cuts.len() && i >= cuts[segment] {
            segment += 1;
        }
        if segment % 2 == 1 {
            child_a.inherit(i);
        } else {
            child_b.inherit(i);
        }
    }

    (child_a, child_b)
}
