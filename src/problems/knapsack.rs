//! Bounded knapsack.

use crate::compile::{CompileConfig, Compiled, Compiler};
use crate::error::{QuboError, Result};
use crate::penalty::{LinearExpr, PenaltyBlock};
use crate::registry::VarKey;
use crate::solve::Solution;

/// Buy quantities of items to maximize total value within a budget.
///
/// Item `i` is `Item(i)` with domain `0..=bounds[i]`; a bound of 1 gives
/// the classic 0/1 knapsack. The budget becomes one `AtMost` block whose
/// slack the compiler allocates, and the objective is `−Σ value·q`.
///
/// # Examples
///
/// ```
/// use u_qubo::compile::CompileConfig;
/// use u_qubo::problems::{Knapsack, KnapsackWeights};
/// use u_qubo::solve::{ExactSolver, SolveParams, SolverAdapter};
///
/// let problem = Knapsack::binary(vec![6, 5], vec![5, 4], 10);
/// let config = CompileConfig::default();
/// let compiled = problem
///     .compile(&KnapsackWeights::for_problem(&problem, &config), &config)
///     .unwrap();
///
/// let solution =
///     SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default()).unwrap();
/// assert_eq!(problem.interpret(&solution).quantities, vec![1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Knapsack {
    pub costs: Vec<i64>,
    pub values: Vec<i64>,
    /// Largest quantity of each item.
    pub bounds: Vec<i64>,
    pub budget: i64,
}

/// Lagrange weights for [`Knapsack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnapsackWeights {
    pub budget: i64,
}

impl KnapsackWeights {
    /// Smallest weights meeting `A > B·max|value|`.
    pub fn for_problem(problem: &Knapsack, config: &CompileConfig) -> Self {
        let max_value = problem.values.iter().map(|v| v.abs()).max().unwrap_or(0);
        Self {
            budget: config.objective_weight.saturating_mul(max_value).saturating_add(1),
        }
    }
}

/// Decoded purchase plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnapsackSelection {
    /// Quantity bought of each item.
    pub quantities: Vec<u64>,
    pub total_cost: i64,
    pub total_value: i64,
    /// Unspent budget according to the slack variable.
    pub slack: u64,
}

impl KnapsackSelection {
    pub fn within_budget(&self, budget: i64) -> bool {
        self.total_cost <= budget
    }
}

impl Knapsack {
    pub fn new(costs: Vec<i64>, values: Vec<i64>, bounds: Vec<i64>, budget: i64) -> Self {
        Self {
            costs,
            values,
            bounds,
            budget,
        }
    }

    /// 0/1 knapsack: every bound is 1.
    pub fn binary(costs: Vec<i64>, values: Vec<i64>, budget: i64) -> Self {
        let bounds = vec![1; costs.len()];
        Self::new(costs, values, bounds, budget)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.costs.len();
        if self.values.len() != n || self.bounds.len() != n {
            return Err(QuboError::InvalidProblem(format!(
                "{n} costs, {} values and {} bounds",
                self.values.len(),
                self.bounds.len()
            )));
        }
        if let Some((i, cost)) = self.costs.iter().enumerate().find(|(_, &c)| c < 0) {
            return Err(QuboError::InvalidProblem(format!(
                "item {i} has negative cost {cost}"
            )));
        }
        if self.budget < 0 {
            return Err(QuboError::InvalidProblem(format!(
                "budget must be non-negative, got {}",
                self.budget
            )));
        }
        Ok(())
    }

    pub fn compile(&self, weights: &KnapsackWeights, config: &CompileConfig) -> Result<Compiled> {
        self.validate()?;
        let mut compiler = Compiler::new(config.clone())?;

        for (i, &bound) in self.bounds.iter().enumerate() {
            compiler.declare(VarKey::Item(i), bound)?;
        }
        compiler.add_objective(
            self.values
                .iter()
                .enumerate()
                .map(|(i, &value)| (VarKey::Item(i), -value))
                .collect(),
        )?;
        let spend: LinearExpr = self
            .costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| (VarKey::Item(i), cost))
            .collect();
        compiler.add_block(PenaltyBlock::at_most(
            "budget",
            spend,
            self.budget,
            weights.budget,
        ))?;

        Ok(compiler.finish())
    }

    pub fn interpret(&self, solution: &Solution) -> KnapsackSelection {
        let quantities: Vec<u64> = (0..self.len())
            .map(|i| solution.value(&VarKey::Item(i)).unwrap_or(0))
            .collect();
        let total = |per_unit: &[i64]| -> i64 {
            per_unit
                .iter()
                .zip(&quantities)
                .map(|(&c, &q)| c * q as i64)
                .sum()
        };
        KnapsackSelection {
            total_cost: total(&self.costs),
            total_value: total(&self.values),
            slack: solution.value(&VarKey::Slack(0)).unwrap_or(0),
            quantities,
        }
    }
}
