//! Variable registry.
//!
//! Assigns every modeled quantity a typed, collision-free [`VarKey`] and
//! records its domain bound. A registry lives for exactly one compilation.

mod key;
mod variables;

pub use key::{PieceId, VarKey};
pub use variables::{Variable, VariableRegistry};
