//! Population-level driver for the spatial operators.
//!
//! Every individual is processed independently. Per-task RNG seeds are drawn
//! sequentially from one master [`OperatorRng`] before the parallel section,
//! so results depend only on the master seed, not on thread scheduling.

use rand::prelude::*;
use rayon::prelude::*;

use crate::schema::{ConfigError, OptimizationConfig};

use super::{
    Grid, GridError, ObjectiveEvaluator, PatchLabeler, SpatialCrossover, SpatialMutation,
    SpatialSampler, YieldMaps,
};

/// Master random number generator for operator batches.
pub struct OperatorRng {
    rng: StdRng,
}

impl OperatorRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate next u64 for seeding task RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Independent RNG for one task.
    pub fn fork(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.next_seed())
    }

    fn seeds(&mut self, count: usize) -> Vec<u64> {
        (0..count).map(|_| self.next_seed()).collect()
    }
}

/// Fail unless every grid has the shape of the first.
pub fn ensure_uniform_shape<'a, I>(grids: I) -> Result<(), GridError>
where
    I: IntoIterator<Item = &'a Grid>,
{
    let mut grids = grids.into_iter();
    let Some(first) = grids.next() else {
        return Ok(());
    };
    grids.try_for_each(|grid| first.ensure_shape("population member", grid.shape()))
}

/// All spatial operators built from one [`OptimizationConfig`].
pub struct SpatialOperators {
    config: OptimizationConfig,
    labeler: PatchLabeler,
    crossover: SpatialCrossover,
    mutation: SpatialMutation,
    sampler: SpatialSampler,
}

impl SpatialOperators {
    /// Validate `config` and build every operator from it.
    pub fn new(config: OptimizationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let labeler = PatchLabeler::new(config.labeling);
        let crossover = SpatialCrossover::new(labeler, config.crossover)
            .with_round_trip_check(config.verify_round_trip);
        let mutation = SpatialMutation::new(labeler, &config.mutation)
            .with_round_trip_check(config.verify_round_trip);
        let sampler = SpatialSampler::new(labeler, &config.sampling);

        Ok(Self {
            config,
            labeler,
            crossover,
            mutation,
            sampler,
        })
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn labeler(&self) -> &PatchLabeler {
        &self.labeler
    }

    pub fn crossover(&self) -> &SpatialCrossover {
        &self.crossover
    }

    pub fn mutation(&self) -> &SpatialMutation {
        &self.mutation
    }

    pub fn sampler(&self) -> &SpatialSampler {
        &self.sampler
    }

    /// Master RNG seeded from the configuration, or from entropy if unset.
    pub fn rng(&self) -> OperatorRng {
        self.config
            .random_seed
            .map_or_else(OperatorRng::random, OperatorRng::new)
    }

    /// Objective evaluator sharing this labeling configuration.
    pub fn evaluator(&self, yield_maps: YieldMaps) -> Result<ObjectiveEvaluator, GridError> {
        ObjectiveEvaluator::new(self.labeler, &self.config.objectives, yield_maps)
    }

    /// `size` independent realizations of `base`.
    pub fn sample_population(&self, base: &Grid, size: usize, rng: &mut OperatorRng) -> Vec<Grid> {
        rng.seeds(size)
            .into_par_iter()
            .map(|seed| self.sampler.sample(base, &mut StdRng::seed_from_u64(seed)))
            .collect()
    }

    /// Two children per mating, in mating order.
    pub fn crossover_matings(
        &self,
        matings: &[(&Grid, &Grid)],
        rng: &mut OperatorRng,
    ) -> Result<Vec<Grid>, GridError> {
        ensure_uniform_shape(matings.iter().flat_map(|&(a, b)| [a, b]))?;

        let children: Vec<(Grid, Grid)> = rng
            .seeds(matings.len())
            .into_par_iter()
            .zip(matings.par_iter())
            .map(|(seed, &(a, b))| {
                self.crossover
                    .cross(a, b, &mut StdRng::seed_from_u64(seed))
            })
            .collect::<Result<_, _>>()?;

        log::debug!(
            "crossover produced {} children from {} matings",
            children.len() * 2,
            matings.len()
        );
        Ok(children.into_iter().flat_map(|(a, b)| [a, b]).collect())
    }

    /// Mutate every individual independently.
    pub fn mutate_population(
        &self,
        population: &[Grid],
        rng: &mut OperatorRng,
    ) -> Result<Vec<Grid>, GridError> {
        ensure_uniform_shape(population)?;

        rng.seeds(population.len())
            .into_par_iter()
            .zip(population.par_iter())
            .map(|(seed, grid)| {
                self.mutation
                    .mutate(grid, &mut StdRng::seed_from_u64(seed))
            })
            .collect()
    }

    /// Crossover followed by mutation of every child.
    pub fn offspring(
        &self,
        matings: &[(&Grid, &Grid)],
        rng: &mut OperatorRng,
    ) -> Result<Vec<Grid>, GridError> {
        let children = self.crossover_matings(matings, rng)?;
        self.mutate_population(&children, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CrossoverConfig, MutationConfig, MutationPolicy, PolicyEntry, TriggerRule};

    fn config(seed: u64) -> OptimizationConfig {
        OptimizationConfig {
            crossover: CrossoverConfig { num_cut_points: 2 },
            mutation: MutationConfig {
                apply_probability: 0.0,
                gene_probability: 0.5,
                ..Default::default()
            },
            random_seed: Some(seed),
            verify_round_trip: true,
            ..Default::default()
        }
    }

    fn base() -> Grid {
        let cells = (0..16 * 16)
            .map(|i| match (i / 16, i % 16) {
                (_, 7) => 8,
                (r, c) if r < 8 && c < 7 => 1,
                (r, _) if r < 8 => 2,
                (_, c) if c < 7 => 4,
                _ => 7,
            })
            .collect();
        Grid::new(16, 16, cells).unwrap()
    }

    #[test]
    fn test_operator_rng_is_reproducible() {
        let mut a = OperatorRng::new(12);
        let mut b = OperatorRng::new(12);
        assert_eq!(a.seeds(5), b.seeds(5));
        assert_eq!(a.fork().r#gen::<u64>(), b.fork().r#gen::<u64>());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config(0);
        bad.mutation.apply_probability = -0.1;
        assert!(SpatialOperators::new(bad).is_err());

        let mut reserved = config(0);
        reserved.mutation.policy = MutationPolicy {
            name: "reserved".into(),
            version: 1,
            entries: vec![
                PolicyEntry {
                    threshold: 0.5,
                    class: 8,
                },
                PolicyEntry {
                    threshold: 1.0,
                    class: 0,
                },
            ],
        }
        .into();
        assert!(matches!(
            SpatialOperators::new(reserved),
            Err(ConfigError::ReservedPolicyClass { class: 8, .. })
        ));
    }

    #[test]
    fn test_batches_are_seed_deterministic() {
        let ops = SpatialOperators::new(config(7)).unwrap();
        let run = || {
            let mut rng = ops.rng();
            let population = ops.sample_population(&base(), 6, &mut rng);
            let matings: Vec<(&Grid, &Grid)> =
                population.chunks(2).map(|p| (&p[0], &p[1])).collect();
            let children = ops.offspring(&matings, &mut rng).unwrap();
            (population, children)
        };
        let (pop_a, children_a) = run();
        let (pop_b, children_b) = run();
        assert_eq!(pop_a, pop_b);
        assert_eq!(children_a, children_b);
        assert_eq!(children_a.len(), 6);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ops = SpatialOperators::new(config(3)).unwrap();
        let population = ops.sample_population(&base(), 8, &mut OperatorRng::new(1));

        let parallel = ops
            .mutate_population(&population, &mut OperatorRng::new(99))
            .unwrap();

        let mut master = OperatorRng::new(99);
        let sequential: Vec<Grid> = population
            .iter()
            .map(|grid| ops.mutation().mutate(grid, &mut master.fork()).unwrap())
            .collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_static_cells_survive_offspring() {
        let ops = SpatialOperators::new(config(5)).unwrap();
        let mut rng = ops.rng();
        let population = ops.sample_population(&base(), 4, &mut rng);
        let matings = [(&population[0], &population[1]), (&population[2], &population[3])];
        let children = ops.offspring(&matings, &mut rng).unwrap();
        for child in &children {
            for row in 0..16 {
                assert_eq!(child.get(row, 7), 8);
            }
        }
    }

    #[test]
    fn test_skip_everything_returns_population() {
        let mut cfg = config(2);
        cfg.mutation.apply_probability = 1.0;
        cfg.mutation.apply_rule = TriggerRule::Exceeds;
        let ops = SpatialOperators::new(cfg).unwrap();
        let population = ops.sample_population(&base(), 5, &mut OperatorRng::new(0));
        let mutated = ops
            .mutate_population(&population, &mut OperatorRng::new(3))
            .unwrap();
        assert_eq!(mutated, population);
    }

    #[test]
    fn test_mixed_shapes_fail_fast() {
        let ops = SpatialOperators::new(config(1)).unwrap();
        let population = vec![Grid::filled(3, 3, 1), Grid::filled(3, 4, 1)];
        let mut rng = OperatorRng::new(0);
        assert!(matches!(
            ops.mutate_population(&population, &mut rng),
            Err(GridError::DimensionMismatch { .. })
        ));
        let matings = [(&population[0], &population[0]), (&population[1], &population[1])];
        assert!(ops.crossover_matings(&matings, &mut rng).is_err());
    }

    #[test]
    fn test_evaluator_uses_objective_config() {
        let mut cfg = config(1);
        cfg.objectives.include_patch_count = true;
        let ops = SpatialOperators::new(cfg).unwrap();
        let evaluator = ops.evaluator(YieldMaps::uniform(16, 16, 1.0)).unwrap();
        let scores = evaluator.evaluate_population(&[base()]).unwrap();
        assert_eq!(scores[0].patch_count, Some(4));
    }
}
