//! Piecewise encoder.
//!
//! Converts a bounded integer variable into a small set of weighted pieces
//! whose weighted sum takes every value in `[0, bound]` and nothing else.
//!
//! # Binary form
//!
//! With `M = floor(log2(B))` the weights are `1, 2, …, 2^(M-1)` followed by
//! a remainder weight `B + 1 - 2^M`. The power-of-two tiers reach
//! `0..2^M - 1`; adding the remainder tier shifts that window up to end at
//! exactly `B`, and the two windows overlap, so there are no gaps.
//!
//! # References
//!
//! Lucas (2014), "Ising formulations of many NP problems", §2.4

mod config;
mod piecewise;

pub use config::EncodingMode;
pub use piecewise::{binary_weights, Encoding, Piece, PiecewiseEncoder};
