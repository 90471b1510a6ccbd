//! Configuration types for the spatial genetic operators and objectives.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    BiomassTable, ClassCode, LandUse, MutationPolicy, PolicyVariant, StaticClassSet, TriggerRule,
};

/// Top-level configuration handed to [`crate::compute::SpatialOperators`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Patch labeling rules shared by every operator.
    #[serde(default)]
    pub labeling: LabelingConfig,
    #[serde(default)]
    pub crossover: CrossoverConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default)]
    pub objectives: ObjectiveConfig,
    /// Initial population sampling.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Check the genome round trip on every operator invocation.
    #[serde(default)]
    pub verify_round_trip: bool,
}

impl OptimizationConfig {
    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mutation.validate()?;
        self.objectives.validate()?;
        self.sampling.validate()?;
        self.labeling
            .check_policy_classes(&self.mutation.policy.policy())?;
        self.labeling
            .check_policy_classes(&self.sampling.policy.policy())?;
        Ok(())
    }
}

/// Adjacency rule for patch growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborMode {
    /// Orthogonal neighbours only.
    #[default]
    Four,
    /// Orthogonal and diagonal neighbours.
    Eight,
}

/// Which cells take part in patches and how patches connect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelingConfig {
    /// Classes never labeled, mutated or recombined.
    #[serde(default)]
    pub static_classes: StaticClassSet,
    /// Cell value marking missing data.
    #[serde(default = "default_no_data_value")]
    pub no_data_value: ClassCode,
    #[serde(default)]
    pub neighbor_mode: NeighborMode,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            static_classes: StaticClassSet::default(),
            no_data_value: default_no_data_value(),
            neighbor_mode: NeighborMode::default(),
        }
    }
}

impl LabelingConfig {
    /// Whether `class` is excluded from labeling.
    pub fn is_reserved(&self, class: ClassCode) -> bool {
        class == self.no_data_value || self.static_classes.contains(class)
    }

    /// Reject policies that would write static or no-data codes into patches.
    pub fn check_policy_classes(&self, policy: &MutationPolicy) -> Result<(), ConfigError> {
        match policy.classes().find(|&class| self.is_reserved(class)) {
            Some(class) => Err(ConfigError::ReservedPolicyClass {
                policy: policy.name.clone(),
                class,
            }),
            None => Ok(()),
        }
    }
}

fn default_no_data_value() -> ClassCode {
    0
}

/// Spatial n-point crossover settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverConfig {
    /// Number of genome cut points. Zero disables recombination.
    #[serde(default = "default_num_cut_points")]
    pub num_cut_points: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            num_cut_points: default_num_cut_points(),
        }
    }
}

fn default_num_cut_points() -> usize {
    3
}

/// Spatial random-reset mutation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Compared against one uniform draw per individual using `apply_rule`.
    #[serde(default = "default_apply_probability")]
    pub apply_probability: f64,
    /// How the per-individual draw is compared to `apply_probability`.
    #[serde(default)]
    pub apply_rule: TriggerRule,
    /// Compared against one uniform draw per gene using `gene_rule`.
    #[serde(default = "default_gene_probability")]
    pub gene_probability: f64,
    /// How the per-gene draw is compared to `gene_probability`.
    #[serde(default)]
    pub gene_rule: TriggerRule,
    /// Distribution of replacement classes.
    #[serde(default)]
    pub policy: PolicyVariant,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            apply_probability: default_apply_probability(),
            apply_rule: TriggerRule::default(),
            gene_probability: default_gene_probability(),
            gene_rule: TriggerRule::default(),
            policy: PolicyVariant::default(),
        }
    }
}

fn default_apply_probability() -> f64 {
    0.3
}
fn default_gene_probability() -> f64 {
    0.1
}

impl MutationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("mutation.apply_probability", self.apply_probability)?;
        check_probability("mutation.gene_probability", self.gene_probability)?;
        self.policy.policy().validate()
    }
}

/// Objective evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    /// Area of one cell (hectares).
    #[serde(default = "default_cell_area")]
    pub cell_area: f64,
    /// Class whose cells collect potential yield from every yield map.
    #[serde(default = "default_yield_class")]
    pub yield_class: ClassCode,
    #[serde(default)]
    pub biomass: BiomassTable,
    /// Append the patch count to each objective vector.
    #[serde(default)]
    pub include_patch_count: bool,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            cell_area: default_cell_area(),
            yield_class: default_yield_class(),
            biomass: BiomassTable::default(),
            include_patch_count: false,
        }
    }
}

/// 2.5 km x 2.5 km cells, in hectares.
fn default_cell_area() -> f64 {
    2.5 * 2.5
}
fn default_yield_class() -> ClassCode {
    LandUse::Sugarcane.code()
}

impl ObjectiveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_area.is_finite() && self.cell_area > 0.0) {
            return Err(ConfigError::InvalidCellArea(self.cell_area));
        }
        Ok(())
    }
}

/// Initial population sampling around a base map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Cells whose smoothed random value falls below this are reassigned.
    #[serde(default = "default_change_threshold")]
    pub change_threshold: f64,
    /// Distribution of classes for reassigned cells.
    #[serde(default)]
    pub policy: PolicyVariant,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            change_threshold: default_change_threshold(),
            policy: PolicyVariant::default(),
        }
    }
}

fn default_change_threshold() -> f64 {
    0.3
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.change_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::InvalidChangeThreshold(t));
        }
        self.policy.policy().validate()
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },
    #[error("Change threshold must be within (0, 1], got {0}")]
    InvalidChangeThreshold(f64),
    #[error("Cell area must be positive and finite, got {0}")]
    InvalidCellArea(f64),
    #[error("Policy '{0}' has no entries")]
    EmptyPolicy(String),
    #[error("Policy '{policy}' entry {index} has threshold {threshold}; thresholds must ascend within (0, 1]")]
    InvalidPolicyThreshold {
        policy: String,
        index: usize,
        threshold: f64,
    },
    #[error("Policy '{policy}' produces class {class}, which is static or no-data")]
    ReservedPolicyClass { policy: String, class: ClassCode },
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
