//! Exhaustive search.

use std::time::Instant;

use tracing::debug;

use super::indexed::IndexedModel;
use super::types::{QuboSolver, Sample, SolveParams};
use crate::error::{QuboError, Result};
use crate::model::QuadraticModel;

/// Enumerates every assignment and keeps the lowest energy.
///
/// States are visited in mixed-radix order with the first piece as the
/// fastest digit; each step updates the energy incrementally, and ties
/// keep the earliest state. Only `time_limit` is read from the params.
#[derive(Debug, Clone, Copy)]
pub struct ExactSolver {
    /// Largest number of states the solver agrees to visit.
    pub max_states: u128,
}

impl Default for ExactSolver {
    fn default() -> Self {
        Self {
            max_states: 1 << 22,
        }
    }
}

impl ExactSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_states(mut self, max_states: u128) -> Self {
        self.max_states = max_states;
        self
    }

    fn state_count(indexed: &IndexedModel) -> Option<u128> {
        indexed
            .domains
            .iter()
            .try_fold(1u128, |acc, &max| acc.checked_mul(max as u128 + 1))
    }
}

impl QuboSolver for ExactSolver {
    fn name(&self) -> &str {
        "exact"
    }

    fn sample(&self, model: &QuadraticModel, params: &SolveParams) -> Result<Sample> {
        let indexed = IndexedModel::new(model)?;
        let states = Self::state_count(&indexed).unwrap_or(u128::MAX);
        if states > self.max_states {
            return Err(QuboError::ModelTooLarge {
                states,
                limit: self.max_states,
            });
        }

        let budget = params.time_budget();
        let start = Instant::now();

        let n = indexed.len();
        let mut state = vec![0u64; n];
        let mut energy = 0i64;
        let mut best = state.clone();
        let mut best_energy = energy;

        for visited in 1..states {
            if visited % 4096 == 0 {
                if let Some(limit) = budget {
                    if start.elapsed() > limit {
                        return Err(QuboError::SolverTimeout(limit));
                    }
                }
            }

            // Odometer step: reset saturated digits, bump the first free one.
            for i in 0..n {
                if state[i] < indexed.domains[i] {
                    energy += indexed.delta(&state, i, state[i] + 1);
                    state[i] += 1;
                    break;
                }
                energy += indexed.delta(&state, i, 0);
                state[i] = 0;
            }

            if energy < best_energy {
                best_energy = energy;
                best.clone_from(&state);
            }
        }

        debug!(states, best_energy, "exhaustive search finished");
        Ok(Sample {
            assignment: indexed.to_assignment(&best),
            energy: best_energy as f64,
        })
    }
}
