//! Spatial random-reset mutation on patch genomes.

use rand::Rng;

use crate::schema::{MutationConfig, MutationPolicy, TriggerRule};

use super::{EncodedGrid, Genome, Grid, GridError, PatchLabeler, verify_round_trip};

/// Reassigns whole patches to classes drawn from a [`MutationPolicy`].
#[derive(Debug, Clone)]
pub struct SpatialMutation {
    labeler: PatchLabeler,
    apply_probability: f64,
    apply_rule: TriggerRule,
    gene_probability: f64,
    gene_rule: TriggerRule,
    policy: MutationPolicy,
    verify_round_trip: bool,
}

impl SpatialMutation {
    pub fn new(labeler: PatchLabeler, config: &MutationConfig) -> Self {
        Self {
            labeler,
            apply_probability: config.apply_probability,
            apply_rule: config.apply_rule,
            gene_probability: config.gene_probability,
            gene_rule: config.gene_rule,
            policy: config.policy.policy(),
            verify_round_trip: false,
        }
    }

    /// Check the genome round trip before every mutation.
    pub fn with_round_trip_check(mut self, enabled: bool) -> Self {
        self.verify_round_trip = enabled;
        self
    }

    pub fn policy(&self) -> &MutationPolicy {
        &self.policy
    }

    /// Mutate one grid. Static and no-data cells are never touched.
    ///
    /// One draw decides whether this individual is mutated at all; grids
    /// without any patch come back unchanged.
    pub fn mutate<R: Rng + ?Sized>(&self, grid: &Grid, rng: &mut R) -> Result<Grid, GridError> {
        if !self
            .apply_rule
            .fires(rng.r#gen::<f64>(), self.apply_probability)
        {
            return Ok(grid.clone());
        }

        let encoded = EncodedGrid::new(&self.labeler, grid);
        if self.verify_round_trip {
            verify_round_trip(grid, &encoded.patch_map)?;
        }
        if encoded.genome.is_empty() {
            log::debug!("mutation skipped: grid has no patches");
            return Ok(grid.clone());
        }

        let genome = self.mutate_genome(&encoded.genome, rng);
        encoded.decode_with(&genome, grid)
    }

    /// Random-reset every gene but the first.
    ///
    /// A gene is considered when its draw passes `gene_rule` against
    /// `gene_probability`; the policy may still decline to replace it.
    pub fn mutate_genome<R: Rng + ?Sized>(&self, genome: &Genome, rng: &mut R) -> Genome {
        let mut mutated = genome.clone();
        let mut replaced = 0usize;
        for i in 1..genome.len() {
            if !self
                .gene_rule
                .fires(rng.r#gen::<f64>(), self.gene_probability)
            {
                continue;
            }
            if let Some(class) = self.policy.sample(rng.r#gen::<f64>()) {
                mutated.set(i, class);
                replaced += 1;
            }
        }
        log::trace!(
            "mutated {} of {} genes with policy {} v{}",
            replaced,
            genome.len(),
            self.policy.name,
            self.policy.version
        );
        mutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LabelingConfig, NeighborMode, PolicyVariant, StaticClassSet};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn labeler() -> PatchLabeler {
        PatchLabeler::new(LabelingConfig {
            static_classes: StaticClassSet::from_codes([8, 9]),
            no_data_value: 0,
            neighbor_mode: NeighborMode::Four,
        })
    }

    fn mutation(config: MutationConfig) -> SpatialMutation {
        SpatialMutation::new(labeler(), &config).with_round_trip_check(true)
    }

    /// Mutation that always applies and always considers every gene.
    fn aggressive(policy: PolicyVariant) -> SpatialMutation {
        mutation(MutationConfig {
            apply_probability: 1.0,
            apply_rule: TriggerRule::Below,
            gene_probability: 1.0,
            gene_rule: TriggerRule::Below,
            policy,
        })
    }

    fn checkerboard(rows: usize, cols: usize) -> Grid {
        let cells = (0..rows * cols)
            .map(|i| if (i / cols + i % cols) % 2 == 0 { 1 } else { 2 })
            .collect();
        Grid::new(rows, cols, cells).unwrap()
    }

    #[test]
    fn test_full_skip_probability_never_mutates() {
        let grid = checkerboard(5, 5);
        let m = mutation(MutationConfig {
            apply_probability: 1.0,
            gene_probability: 0.0,
            ..Default::default()
        });
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(m.mutate(&grid, &mut rng).unwrap(), grid);
        }
    }

    #[test]
    fn test_gene_rule_direction_is_respected() {
        let grid = checkerboard(4, 4);
        let mut rng = StdRng::seed_from_u64(5);

        // Below with zero probability never selects a gene.
        let quiet = mutation(MutationConfig {
            apply_probability: 1.0,
            apply_rule: TriggerRule::Below,
            gene_probability: 0.0,
            gene_rule: TriggerRule::Below,
            ..Default::default()
        });
        assert_eq!(quiet.mutate(&grid, &mut rng).unwrap(), grid);

        // Exceeds with probability one never selects a gene either.
        let also_quiet = mutation(MutationConfig {
            apply_probability: 1.0,
            apply_rule: TriggerRule::Below,
            gene_probability: 1.0,
            gene_rule: TriggerRule::Exceeds,
            ..Default::default()
        });
        assert_eq!(also_quiet.mutate(&grid, &mut rng).unwrap(), grid);
    }

    #[test]
    fn test_first_patch_is_preserved() {
        let grid = checkerboard(4, 4);
        let m = aggressive(PolicyVariant::WithSecondaryVegetation);
        let map = labeler().label(&grid);
        for seed in 0..20 {
            let child = m.mutate(&grid, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(child.get(0, 0), 1);
            for (i, &id) in map.ids().iter().enumerate() {
                if id > 1 {
                    assert!((3..=7).contains(&child.data()[i]));
                }
            }
        }
    }

    #[test]
    fn test_crops_only_policy_classes() {
        let grid = checkerboard(6, 6);
        let m = aggressive(PolicyVariant::CropsOnly);
        let mut rng = StdRng::seed_from_u64(11);
        let child = m.mutate(&grid, &mut rng).unwrap();
        for (&before, &after) in grid.data().iter().zip(child.data()) {
            assert!(after == before || (4..=7).contains(&after));
        }
    }

    #[test]
    fn test_mutate_genome_skips_index_zero() {
        let m = aggressive(PolicyVariant::WithSecondaryVegetation);
        let genome = Genome::from(vec![1, 1, 1, 1, 1, 1]);
        let mutated = m.mutate_genome(&genome, &mut StdRng::seed_from_u64(2));
        assert_eq!(mutated.get(0), Some(1));
        assert!((1..6).all(|i| matches!(mutated.get(i), Some(3..=7))));
    }

    #[test]
    fn test_static_grid_unchanged() {
        let grid = Grid::from_rows(vec![vec![8, 9], vec![0, 8]]).unwrap();
        let m = aggressive(PolicyVariant::WithSecondaryVegetation);
        assert_eq!(m.mutate(&grid, &mut StdRng::seed_from_u64(0)).unwrap(), grid);
    }

    #[test]
    fn test_mutation_is_seed_deterministic() {
        let grid = checkerboard(7, 5);
        let m = aggressive(PolicyVariant::WithSecondaryVegetation);
        let a = m.mutate(&grid, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = m.mutate(&grid, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_static_cells_untouched(
            (rows, cols, cells) in (1usize..8, 1usize..8)
                .prop_flat_map(|(r, c)| (Just(r), Just(c), prop::collection::vec(0u8..=9, r * c))),
            seed in any::<u64>(),
        ) {
            let grid = Grid::new(rows, cols, cells).unwrap();
            let m = aggressive(PolicyVariant::WithSecondaryVegetation);
            let child = m.mutate(&grid, &mut StdRng::seed_from_u64(seed)).unwrap();
            prop_assert_eq!(child.shape(), grid.shape());
            for (&before, &after) in grid.data().iter().zip(child.data()) {
                if matches!(before, 0 | 8 | 9) {
                    prop_assert_eq!(after, before);
                }
            }
        }
    }
}
