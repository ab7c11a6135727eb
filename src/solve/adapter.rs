//! Solver hand-off and decoding.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, warn};

use super::types::{QuboSolver, Sample, SolveParams};
use crate::compile::Compiled;
use crate::error::{QuboError, Result};
use crate::registry::{PieceId, VarKey};

/// A decoded solver answer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Value of every declared variable, slack included.
    pub values: BTreeMap<VarKey, u64>,
    /// Exact model energy of the assignment.
    pub energy: i64,
    /// Energy the solver reported.
    pub solver_energy: f64,
    /// Raw piece values as returned by the solver.
    pub raw: BTreeMap<PieceId, u64>,
}

impl Solution {
    pub fn value(&self, key: &VarKey) -> Option<u64> {
        self.values.get(key).copied()
    }

    /// Whether a flag (or any variable) is non-zero.
    pub fn is_set(&self, key: &VarKey) -> bool {
        self.value(key).is_some_and(|v| v > 0)
    }
}

/// Runs a solver on a compiled model and maps its answer back to the
/// declared variables.
///
/// The adapter does not check constraints; call
/// [`Compiled::verify`] on the result.
///
/// # Examples
///
/// ```
/// use u_qubo::compile::{CompileConfig, Compiler};
/// use u_qubo::penalty::{LinearExpr, PenaltyBlock};
/// use u_qubo::registry::VarKey;
/// use u_qubo::solve::{ExactSolver, SolveParams, SolverAdapter};
///
/// let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
/// compiler.declare(VarKey::Item(0), 4).unwrap();
/// compiler
///     .add_block(PenaltyBlock::equality("hit 3", LinearExpr::sum([VarKey::Item(0)]), 3, 1))
///     .unwrap();
/// let compiled = compiler.finish();
///
/// let solution = SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default())
///     .unwrap();
/// assert_eq!(solution.value(&VarKey::Item(0)), Some(3));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SolverAdapter;

impl SolverAdapter {
    /// Solves and decodes.
    ///
    /// # Errors
    /// `InvalidConfig` for bad params, anything the solver returns, and
    /// decode errors.
    pub fn solve<S: QuboSolver + ?Sized>(
        compiled: &Compiled,
        solver: &S,
        params: &SolveParams,
    ) -> Result<Solution> {
        params.validate().map_err(QuboError::InvalidConfig)?;
        let model = compiled.model();

        info!(
            event = "solve_start",
            solver = solver.name(),
            pieces = model.num_pieces(),
            interactions = model.num_interactions(),
        );
        let start = Instant::now();
        let sample = solver.sample(model, params)?;
        let solution = Self::decode(compiled, &sample)?;
        info!(
            event = "solve_end",
            solver = solver.name(),
            energy = solution.energy,
            elapsed_ms = start.elapsed().as_millis() as u64,
        );
        Ok(solution)
    }

    /// Decodes a raw sample.
    ///
    /// # Errors
    /// `SolverInfeasible` for an empty sample of a non-empty model;
    /// `DecodeInconsistency` for pieces that are unknown, missing, or out
    /// of their domain.
    pub fn decode(compiled: &Compiled, sample: &Sample) -> Result<Solution> {
        let model = compiled.model();
        if sample.assignment.is_empty() && model.num_pieces() > 0 {
            return Err(QuboError::SolverInfeasible(
                "sample has no piece values".into(),
            ));
        }
        if let Some(piece) = sample
            .assignment
            .keys()
            .find(|p| model.domain_of(p).is_none())
        {
            return Err(QuboError::DecodeInconsistency {
                piece: *piece,
                reason: "piece is not part of the model".into(),
            });
        }

        let mut values = BTreeMap::new();
        for (key, encoding) in compiled.encodings() {
            values.insert(*key, encoding.value_of(&sample.assignment)?);
        }
        let energy = model.energy(&sample.assignment)?;
        if (energy as f64 - sample.energy).abs() > 1e-6 * (1.0 + energy.abs() as f64) {
            warn!(
                exact = energy,
                reported = sample.energy,
                "solver energy differs from model energy"
            );
        }

        Ok(Solution {
            values,
            energy,
            solver_energy: sample.energy,
            raw: sample.assignment.clone(),
        })
    }
}
