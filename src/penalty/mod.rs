//! Penalty expander.
//!
//! A [`PenaltyBlock`] is an additive term that is zero exactly when its
//! constraint holds and at least its weight `A` otherwise. Squared blocks
//! expand `A·(Σ cₖ·xₖ − T)²` into linear and pairwise coefficients over
//! pieces; linking blocks expand `A·expr·(1 − gate)`.
//!
//! # Calibration
//!
//! For the model's minimum to coincide with the constrained optimum, every
//! block weight must dominate what the objective can gain by violating it.
//! The sufficient condition used here is `A > B·max|c|`, with `B` the
//! objective weight and `c` ranging over objective coefficients.
//!
//! # References
//!
//! Lucas (2014), "Ising formulations of many NP problems"
//! Glover, Kochenberger & Du (2019), "A Tutorial on Formulating and Using QUBO Models"

mod block;
mod expand;
mod expr;

pub use block::{BlockKind, PenaltyBlock};
pub use expand::{expand_linking, expand_squared, PieceExpr};
pub use expr::LinearExpr;
