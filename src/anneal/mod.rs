//! Simulated annealing solver.
//!
//! An in-process [`QuboSolver`](crate::solve::QuboSolver) that runs
//! independent Metropolis reads over the model's pieces and keeps the
//! lowest energy found. Reads are seeded from `SolveParams::seed` plus the
//! read index, so results are reproducible with or without the rayon pool.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod runner;

pub use config::{AnnealConfig, CoolingSchedule};
pub use runner::SimulatedAnnealer;
