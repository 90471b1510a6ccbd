//! Land-use allocation operators for spatial multi-objective search.
//!
//! Candidate solutions are categorical land-use grids. Instead of treating
//! every cell as a gene, each grid is decomposed into patches (maximal
//! connected regions of one class) and each patch becomes one gene, so
//! recombination and mutation move whole regions and keep maps spatially
//! coherent.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration types, land-use classes and mutation policies
//! - `compute`: Labeling, genome codec, crossover, mutation, sampling and
//!   objective evaluation
//!
//! The search engine itself (ranking, selection, termination) lives outside
//! this crate: it hands grids in and receives grids and objective vectors back.
//!
//! # Example
//!
//! ```rust,no_run
//! use landuse_evo::{
//!     compute::{Grid, SpatialOperators, YieldMaps},
//!     schema::OptimizationConfig,
//! };
//!
//! let config = OptimizationConfig {
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//! let operators = SpatialOperators::new(config).unwrap();
//! let mut rng = operators.rng();
//!
//! // Sample an initial population around a base map
//! let base = Grid::filled(64, 64, 1);
//! let population = operators.sample_population(&base, 8, &mut rng);
//!
//! // Recombine consecutive pairs, then mutate the children
//! let matings: Vec<_> = population.chunks(2).map(|p| (&p[0], &p[1])).collect();
//! let children = operators.offspring(&matings, &mut rng).unwrap();
//!
//! // Score the children
//! let evaluator = operators.evaluator(YieldMaps::uniform(64, 64, 3.5)).unwrap();
//! for scores in evaluator.evaluate_population(&children).unwrap() {
//!     println!("yield={:.1} biomass={:.1}", scores.total_yield, scores.total_biomass);
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{
    Grid, GridError, ObjectiveEvaluator, ObjectiveVector, OperatorRng, PatchLabeler, PatchMap,
    SpatialCrossover, SpatialMutation, SpatialOperators,
};
pub use schema::{ConfigError, LandUse, NeighborMode, OptimizationConfig};
