//! Weighted set cover.

use std::collections::BTreeSet;

use crate::compile::{CompileConfig, Compiled, Compiler};
use crate::error::{QuboError, Result};
use crate::penalty::{LinearExpr, PenaltyBlock};
use crate::registry::VarKey;
use crate::solve::Solution;

/// Choose candidate sets of minimum total cost so that every element of
/// the universe `0..universe` is in at least one chosen set.
///
/// # Formulation
///
/// Set `i` is the flag `Item(i)`. Element `α` contained in `M_α` sets gets
/// indicators `Coverage { element: α, count: m }` for `m ∈ 1..=M_α`, with
///
/// - a one-hot block: exactly one count is active, and
/// - an equality block: `Σ m·y_{α,m} = Σ_{i∋α} x_i`.
///
/// The objective is `Σ cost_i·x_i`.
///
/// # Examples
///
/// ```
/// use u_qubo::compile::CompileConfig;
/// use u_qubo::problems::{SetCover, SetCoverWeights};
/// use u_qubo::solve::{ExactSolver, SolveParams, SolverAdapter};
///
/// // universe {a, b}; candidates {a} and {a, b}
/// let problem = SetCover::new(2, vec![vec![0], vec![0, 1]], vec![1, 1]);
/// let config = CompileConfig::default();
/// let weights = SetCoverWeights::for_problem(&problem, &config);
/// let compiled = problem.compile(&weights, &config).unwrap();
///
/// let solution =
///     SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default()).unwrap();
/// assert_eq!(problem.interpret(&solution).chosen, vec![1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetCover {
    /// Number of elements; elements are `0..universe`.
    pub universe: usize,
    /// Members of each candidate set.
    pub sets: Vec<Vec<usize>>,
    /// Cost of each candidate set.
    pub costs: Vec<i64>,
}

/// Lagrange weights for [`SetCover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetCoverWeights {
    /// Weight of both coverage blocks of every element.
    pub coverage: i64,
}

impl SetCoverWeights {
    /// Smallest weights meeting `A > B·max|cost|`.
    pub fn for_problem(problem: &SetCover, config: &CompileConfig) -> Self {
        let max_cost = problem.costs.iter().map(|c| c.abs()).max().unwrap_or(0);
        Self {
            coverage: config.objective_weight.saturating_mul(max_cost).saturating_add(1),
        }
    }
}

/// Decoded set cover.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverSelection {
    /// Indices of chosen sets, ascending.
    pub chosen: Vec<usize>,
    pub total_cost: i64,
    /// Elements no chosen set contains.
    pub uncovered: Vec<usize>,
}

impl CoverSelection {
    pub fn is_cover(&self) -> bool {
        self.uncovered.is_empty()
    }
}

impl SetCover {
    pub fn new(universe: usize, sets: Vec<Vec<usize>>, costs: Vec<i64>) -> Self {
        Self {
            universe,
            sets,
            costs,
        }
    }

    /// Checks shapes and that every element can be covered.
    pub fn validate(&self) -> Result<()> {
        if self.sets.len() != self.costs.len() {
            return Err(QuboError::InvalidProblem(format!(
                "{} sets but {} costs",
                self.sets.len(),
                self.costs.len()
            )));
        }
        for (i, set) in self.sets.iter().enumerate() {
            if let Some(&element) = set.iter().find(|&&e| e >= self.universe) {
                return Err(QuboError::InvalidProblem(format!(
                    "set {i} contains element {element} outside the universe of {}",
                    self.universe
                )));
            }
        }
        if let Some((i, cost)) = self.costs.iter().enumerate().find(|(_, &c)| c < 0) {
            return Err(QuboError::InvalidProblem(format!(
                "set {i} has negative cost {cost}"
            )));
        }
        for element in 0..self.universe {
            if self.carriers(element).is_empty() {
                return Err(QuboError::InvalidProblem(format!(
                    "element {element} is not contained in any set"
                )));
            }
        }
        Ok(())
    }

    /// Sets containing `element`.
    fn carriers(&self, element: usize) -> Vec<usize> {
        self.sets
            .iter()
            .enumerate()
            .filter(|(_, set)| set.contains(&element))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn compile(&self, weights: &SetCoverWeights, config: &CompileConfig) -> Result<Compiled> {
        self.validate()?;
        let mut compiler = Compiler::new(config.clone())?;

        for i in 0..self.sets.len() {
            compiler.declare_binary(VarKey::Item(i))?;
        }
        compiler.add_objective(
            self.costs
                .iter()
                .enumerate()
                .map(|(i, &cost)| (VarKey::Item(i), cost))
                .collect(),
        )?;
        for element in 0..self.universe {
            let members: Vec<VarKey> = self
                .carriers(element)
                .into_iter()
                .map(VarKey::Item)
                .collect();
            add_coverage(&mut compiler, element, &members, weights.coverage)?;
        }

        Ok(compiler.finish())
    }

    pub fn interpret(&self, solution: &Solution) -> CoverSelection {
        let chosen: Vec<usize> = (0..self.sets.len())
            .filter(|&i| solution.is_set(&VarKey::Item(i)))
            .collect();
        let covered: BTreeSet<usize> = chosen
            .iter()
            .flat_map(|&i| self.sets[i].iter().copied())
            .collect();
        CoverSelection {
            total_cost: chosen.iter().map(|&i| self.costs[i]).sum(),
            uncovered: (0..self.universe)
                .filter(|e| !covered.contains(e))
                .collect(),
            chosen,
        }
    }
}

/// Adds the two coverage blocks for one element carried by `members`.
///
/// Declares the element's `Coverage` indicators; `members` must already
/// be declared binary.
pub(crate) fn add_coverage(
    compiler: &mut Compiler,
    element: usize,
    members: &[VarKey],
    weight: i64,
) -> Result<()> {
    let counts: Vec<VarKey> = (1..=members.len())
        .map(|count| VarKey::Coverage { element, count })
        .collect();
    for &key in &counts {
        compiler.declare_binary(key)?;
    }

    compiler.add_block(PenaltyBlock::one_hot(
        format!("cover[{element}]"),
        counts.iter().copied(),
        weight,
    ))?;

    let mut tally = LinearExpr::new();
    for (m, &key) in counts.iter().enumerate() {
        tally.push(key, m as i64 + 1);
    }
    for &member in members {
        tally.push(member, -1);
    }
    compiler.add_block(PenaltyBlock::equality(
        format!("count[{element}]"),
        tally,
        0,
        weight,
    ))
}
