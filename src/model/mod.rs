//! Quadratic coefficient model.
//!
//! [`QuadraticModel`] is the sole artifact handed to solver backends: a
//! sparse map from pieces to linear weights and from unordered piece pairs
//! to quadratic weights. Contributions are strictly additive, so
//! independently built penalty blocks compose without overwriting each
//! other and the result does not depend on the order they were added in.

mod quadratic;

pub(crate) use quadratic::checked_product;
pub use quadratic::QuadraticModel;
