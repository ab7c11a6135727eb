//! Error types for model compilation and solving.

use std::time::Duration;

use thiserror::Error;

use crate::registry::{PieceId, VarKey};

/// Errors raised while compiling, solving, or decoding a quadratic model.
///
/// Compilation errors (`DuplicateVariable`, `InvalidDomain`,
/// `UnknownVariable`, `SelfPair`, `CoefficientOverflow`, `InvalidProblem`)
/// abort the compilation; there is no usable partial model. Solve-time
/// errors are handed back to the caller unchanged and never retried
/// internally.
#[derive(Debug, Error)]
pub enum QuboError {
    /// The same key was declared twice in one compilation.
    #[error("variable {0} declared twice")]
    DuplicateVariable(VarKey),

    /// A domain bound was negative or otherwise unusable.
    #[error("invalid domain bound {bound}: {reason}")]
    InvalidDomain { bound: i64, reason: String },

    /// An expression referenced a key that was never declared.
    #[error("variable {0} was not declared")]
    UnknownVariable(VarKey),

    /// A quadratic term was requested on a single piece.
    #[error("quadratic term on self-pair {0}; fold it into the linear term")]
    SelfPair(PieceId),

    /// A decoded solution violates a constraint the model penalizes.
    #[error("penalty block `{block}` violated at energy {energy}; its weight is too small")]
    MiscalibratedPenalty { block: String, energy: i64 },

    /// The solver's assignment does not match the model's pieces.
    #[error("decode inconsistency at {piece}: {reason}")]
    DecodeInconsistency { piece: PieceId, reason: String },

    /// The solver did not finish within its time budget.
    #[error("solver timed out after {0:?}")]
    SolverTimeout(Duration),

    /// The solver returned no assignment at all.
    #[error("solver produced no sample: {0}")]
    SolverInfeasible(String),

    /// Exhaustive search would exceed its state budget.
    #[error("model has {states} states, above the exhaustive limit of {limit}")]
    ModelTooLarge { states: u128, limit: u128 },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A coefficient or energy does not fit in `i64`.
    #[error("coefficient overflow in {context}")]
    CoefficientOverflow { context: String },

    /// The problem description cannot be compiled.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// A configuration file could not be parsed.
    #[cfg(feature = "serde")]
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QuboError>;
