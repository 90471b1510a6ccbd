//! Compute module - Patch labeling, genome codec, spatial operators and objectives.

mod codec;
mod crossover;
mod grid;
mod labeler;
mod mutation;
mod objectives;
mod operators;
mod sampling;

pub use codec::*;
pub use crossover::*;
pub use grid::*;
pub use labeler::*;
pub use mutation::*;
pub use objectives::*;
pub use operators::*;
pub use sampling::*;
