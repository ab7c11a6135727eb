//! Solver adapter.
//!
//! [`QuboSolver`] is the seam to any backend: given the model's sparse
//! coefficient maps it returns the lowest-energy assignment it found.
//! [`SolverAdapter`] validates the parameters, runs the solver, and decodes
//! piece values back into the declared variables.
//!
//! [`ExactSolver`] enumerates every state; the annealing solver lives in
//! [`crate::anneal`].

mod adapter;
mod exact;
pub(crate) mod indexed;
mod types;

pub use adapter::{Solution, SolverAdapter};
pub use exact::ExactSolver;
pub use types::{QuboSolver, Sample, SolveParams};
