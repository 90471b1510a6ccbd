//! Land-use class vocabulary and class-keyed tables.

use serde::{Deserialize, Serialize};

/// Raw categorical cell value as stored in a grid.
pub type ClassCode = u8;

/// Land-use classes of the Mato Grosso study maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LandUse {
    Forest = 1,
    Cerrado = 2,
    SecondaryVegetation = 3,
    Soy = 4,
    Sugarcane = 5,
    Cotton = 6,
    Pasture = 7,
    Water = 8,
    Urban = 9,
    NoData = 10,
}

impl LandUse {
    /// All classes in code order.
    pub const ALL: [LandUse; 10] = [
        LandUse::Forest,
        LandUse::Cerrado,
        LandUse::SecondaryVegetation,
        LandUse::Soy,
        LandUse::Sugarcane,
        LandUse::Cotton,
        LandUse::Pasture,
        LandUse::Water,
        LandUse::Urban,
        LandUse::NoData,
    ];

    /// Cell code of this class.
    #[inline]
    pub fn code(self) -> ClassCode {
        self as ClassCode
    }

    /// Look up a class by its cell code.
    pub fn from_code(code: ClassCode) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

/// A set of class codes, stored as a 256-bit mask for constant-time lookup.
///
/// Serialized as a sorted list of codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ClassCode>", into = "Vec<ClassCode>")]
pub struct StaticClassSet {
    mask: [u64; 4],
}

impl StaticClassSet {
    /// Empty set.
    pub const fn empty() -> Self {
        Self { mask: [0; 4] }
    }

    /// Build a set from class codes.
    pub fn from_codes<I: IntoIterator<Item = ClassCode>>(codes: I) -> Self {
        let mut set = Self::empty();
        for code in codes {
            set.insert(code);
        }
        set
    }

    /// Add a class code.
    pub fn insert(&mut self, code: ClassCode) {
        self.mask[(code >> 6) as usize] |= 1u64 << (code & 63);
    }

    /// Check membership.
    #[inline]
    pub fn contains(&self, code: ClassCode) -> bool {
        self.mask[(code >> 6) as usize] & (1u64 << (code & 63)) != 0
    }

    /// Number of codes in the set.
    pub fn len(&self) -> usize {
        self.mask.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.iter().all(|&w| w == 0)
    }

    /// Codes in ascending order.
    pub fn codes(&self) -> Vec<ClassCode> {
        (0..=ClassCode::MAX).filter(|&c| self.contains(c)).collect()
    }
}

impl Default for StaticClassSet {
    /// Water, urban and no-data.
    fn default() -> Self {
        Self::from_codes([
            LandUse::Water.code(),
            LandUse::Urban.code(),
            LandUse::NoData.code(),
        ])
    }
}

impl From<Vec<ClassCode>> for StaticClassSet {
    fn from(codes: Vec<ClassCode>) -> Self {
        Self::from_codes(codes)
    }
}

impl From<StaticClassSet> for Vec<ClassCode> {
    fn from(set: StaticClassSet) -> Self {
        set.codes()
    }
}

/// Above-ground biomass density for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassDensity {
    pub class: ClassCode,
    /// Tonnes of dry matter per unit area.
    pub density: f64,
}

/// Per-class above-ground biomass densities. Classes not listed have zero biomass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassTable {
    pub densities: Vec<ClassDensity>,
}

impl BiomassTable {
    /// Density for a class code (0.0 when absent).
    pub fn density(&self, class: ClassCode) -> f64 {
        self.densities
            .iter()
            .find(|d| d.class == class)
            .map_or(0.0, |d| d.density)
    }

    /// Dense lookup table indexed by class code.
    pub fn to_lookup(&self) -> [f64; 256] {
        let mut lut = [0.0; 256];
        for d in &self.densities {
            lut[d.class as usize] = d.density;
        }
        lut
    }
}

impl Default for BiomassTable {
    fn default() -> Self {
        let entry = |class: LandUse, density: f64| ClassDensity {
            class: class.code(),
            density,
        };
        Self {
            densities: vec![
                // Tropical rain forest
                entry(LandUse::Forest, 300.0),
                entry(LandUse::Cerrado, 48.0),
                // Half of forest
                entry(LandUse::SecondaryVegetation, 150.0),
                // Tropical moist grassland, 30% grazed
                entry(LandUse::Pasture, 6.2 * 0.7),
                // Harvested residue
                entry(LandUse::Sugarcane, 16.0),
            ],
        }
    }
}
