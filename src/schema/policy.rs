//! Class-replacement policies for mutation and initial sampling.

use serde::{Deserialize, Serialize};

use super::{ClassCode, ConfigError, LandUse};

/// One step of a cumulative distribution: draws below `threshold` map to `class`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub threshold: f64,
    pub class: ClassCode,
}

/// Discrete distribution over replacement classes, expressed as ascending
/// cumulative thresholds over a uniform draw in `[0, 1)`.
///
/// A draw at or above the last threshold selects nothing, so a policy whose
/// thresholds stop short of 1.0 leaves most genes untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationPolicy {
    pub name: String,
    pub version: u32,
    pub entries: Vec<PolicyEntry>,
}

impl MutationPolicy {
    /// Uniform over secondary vegetation, soy, sugarcane, cotton and pasture.
    pub fn with_secondary_vegetation() -> Self {
        Self::from_steps(
            "with_secondary_vegetation",
            &[
                (0.2, LandUse::SecondaryVegetation),
                (0.4, LandUse::Soy),
                (0.6, LandUse::Sugarcane),
                (0.8, LandUse::Cotton),
                (1.0, LandUse::Pasture),
            ],
        )
    }

    /// Crops only, with a 1% total chance of any replacement per draw.
    pub fn crops_only() -> Self {
        Self::from_steps(
            "crops_only",
            &[
                (0.0025, LandUse::Soy),
                (0.005, LandUse::Sugarcane),
                (0.0075, LandUse::Cotton),
                (0.01, LandUse::Pasture),
            ],
        )
    }

    fn from_steps(name: &str, steps: &[(f64, LandUse)]) -> Self {
        Self {
            name: name.to_string(),
            version: 1,
            entries: steps
                .iter()
                .map(|&(threshold, class)| PolicyEntry {
                    threshold,
                    class: class.code(),
                })
                .collect(),
        }
    }

    /// Map a uniform draw to a replacement class.
    #[inline]
    pub fn sample(&self, draw: f64) -> Option<ClassCode> {
        self.entries
            .iter()
            .find(|e| draw < e.threshold)
            .map(|e| e.class)
    }

    /// Classes this policy can produce, in entry order.
    pub fn classes(&self) -> impl Iterator<Item = ClassCode> + '_ {
        self.entries.iter().map(|e| e.class)
    }

    /// Check that thresholds are in (0, 1] and strictly ascending.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyPolicy(self.name.clone()));
        }
        let mut previous = 0.0;
        for (index, entry) in self.entries.iter().enumerate() {
            let t = entry.threshold;
            if !(t > previous && t <= 1.0) {
                return Err(ConfigError::InvalidPolicyThreshold {
                    policy: self.name.clone(),
                    index,
                    threshold: t,
                });
            }
            previous = t;
        }
        Ok(())
    }
}

/// Which policy the mutation operator draws replacement classes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyVariant {
    WithSecondaryVegetation,
    CropsOnly,
    Custom(MutationPolicy),
}

impl Default for PolicyVariant {
    fn default() -> Self {
        Self::WithSecondaryVegetation
    }
}

impl From<MutationPolicy> for PolicyVariant {
    fn from(policy: MutationPolicy) -> Self {
        Self::Custom(policy)
    }
}

impl PolicyVariant {
    /// Resolve to a concrete policy.
    pub fn policy(&self) -> MutationPolicy {
        match self {
            Self::WithSecondaryVegetation => MutationPolicy::with_secondary_vegetation(),
            Self::CropsOnly => MutationPolicy::crops_only(),
            Self::Custom(policy) => policy.clone(),
        }
    }
}

/// Direction of a probability comparison against a uniform draw `u`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRule {
    /// Fires when `u > p`, i.e. with probability `1 - p`.
    #[default]
    Exceeds,
    /// Fires when `u < p`, i.e. with probability `p`.
    Below,
}

impl TriggerRule {
    #[inline]
    pub fn fires(self, draw: f64, probability: f64) -> bool {
        match self {
            Self::Exceeds => draw > probability,
            Self::Below => draw < probability,
        }
    }
}
