//! Constraint-to-QUBO compiler.
//!
//! Turns a constrained integer optimization problem into a single
//! quadratic model over binary (or small multi-valued) pieces, hands it to
//! a solver, and decodes the answer:
//!
//! - **Registry**: typed, collision-free variable keys with domain bounds.
//! - **Encode**: splits each bounded integer into weighted pieces whose
//!   sums cover exactly `0..=bound`.
//! - **Penalty**: expands `A·(Σ c·x − T)²` and linking blocks into linear
//!   and pairwise coefficients with exact integer arithmetic.
//! - **Model / Compile**: additive, order-independent combination of
//!   objective and penalty contributions into one [`model::QuadraticModel`].
//! - **Solve**: the [`solve::QuboSolver`] seam, an exhaustive solver for
//!   small models, decoding and post-solve verification.
//! - **Anneal**: in-process simulated annealing.
//! - **Problems**: set cover, knapsack and combined procurement builders.
//!
//! # Quick start
//!
//! ```
//! use u_qubo::compile::{CompileConfig, Compiler};
//! use u_qubo::penalty::{LinearExpr, PenaltyBlock};
//! use u_qubo::registry::VarKey;
//! use u_qubo::solve::{ExactSolver, SolveParams, SolverAdapter};
//!
//! // choose exactly one of two suppliers; supplier 1 is cheaper
//! let mut compiler = Compiler::new(CompileConfig::default())?;
//! compiler.declare_binary(VarKey::Supplier(0))?;
//! compiler.declare_binary(VarKey::Supplier(1))?;
//! compiler.add_objective(LinearExpr::new().term(VarKey::Supplier(0), 1))?;
//! compiler.add_block(PenaltyBlock::one_hot(
//!     "one supplier",
//!     [VarKey::Supplier(0), VarKey::Supplier(1)],
//!     2,
//! ))?;
//! let compiled = compiler.finish();
//!
//! let solution = SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default())?;
//! compiled.verify(&solution)?;
//! assert!(solution.is_set(&VarKey::Supplier(1)));
//! # Ok::<(), u_qubo::QuboError>(())
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` on models, configs and problem
//!   descriptions; TOML loading of configs.
//! - `parallel`: annealing reads on the rayon pool.

pub mod anneal;
pub mod compile;
pub mod encode;
pub mod error;
pub mod model;
pub mod penalty;
pub mod problems;
pub mod registry;
pub mod solve;

pub use error::{QuboError, Result};
