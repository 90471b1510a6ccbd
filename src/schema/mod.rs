//! Schema module - Configuration types and land-use vocabulary.

mod config;
mod land_use;
mod policy;

pub use config::*;
pub use land_use::*;
pub use policy::*;
