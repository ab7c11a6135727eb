//! Compilation driver: registry → encoder → expander → combined model.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::config::CompileConfig;
use crate::encode::{Encoding, PiecewiseEncoder};
use crate::error::{QuboError, Result};
use crate::model::{checked_product, QuadraticModel};
use crate::penalty::{expand_linking, expand_squared, BlockKind, LinearExpr, PenaltyBlock, PieceExpr};
use crate::registry::{PieceId, VarKey, Variable, VariableRegistry};
use crate::solve::Solution;

/// A penalty block as it was merged, plus the slack allocated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledBlock {
    pub block: PenaltyBlock,
    /// Slack variable of an `AtMost` block.
    pub slack: Option<VarKey>,
}

/// Builds one [`QuadraticModel`] from variables, objective terms and
/// penalty blocks.
///
/// Declare variables first, then add objective terms and blocks in any
/// order; contributions are additive so the resulting model is the same
/// for every ordering. Any error aborts the compilation.
///
/// # Examples
///
/// ```
/// use u_qubo::compile::{CompileConfig, Compiler};
/// use u_qubo::penalty::{LinearExpr, PenaltyBlock};
/// use u_qubo::registry::VarKey;
///
/// let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
/// compiler.declare_binary(VarKey::Supplier(0)).unwrap();
/// compiler.declare_binary(VarKey::Supplier(1)).unwrap();
/// compiler
///     .add_objective(LinearExpr::new().term(VarKey::Supplier(0), 1))
///     .unwrap();
/// compiler
///     .add_block(PenaltyBlock::one_hot(
///         "one supplier",
///         [VarKey::Supplier(0), VarKey::Supplier(1)],
///         2,
///     ))
///     .unwrap();
///
/// let compiled = compiler.finish();
/// assert_eq!(compiled.model().num_pieces(), 2);
/// assert_eq!(compiled.model().num_interactions(), 1);
/// ```
#[derive(Debug)]
pub struct Compiler {
    config: CompileConfig,
    encoder: PiecewiseEncoder,
    registry: VariableRegistry,
    encodings: BTreeMap<VarKey, Encoding>,
    model: QuadraticModel,
    objective: LinearExpr,
    blocks: Vec<CompiledBlock>,
    next_slack: usize,
}

impl Compiler {
    /// # Errors
    /// `InvalidConfig` if `config` fails validation.
    pub fn new(config: CompileConfig) -> Result<Self> {
        config.validate().map_err(QuboError::InvalidConfig)?;
        Ok(Self {
            encoder: PiecewiseEncoder::new(config.encoding),
            config,
            registry: VariableRegistry::new(),
            encodings: BTreeMap::new(),
            model: QuadraticModel::new(),
            objective: LinearExpr::new(),
            blocks: Vec::new(),
            next_slack: 0,
        })
    }

    /// Declares and encodes a variable with values in `[0, bound]`.
    pub fn declare(&mut self, key: VarKey, bound: i64) -> Result<Variable> {
        let var = self.registry.declare(key, bound)?;
        let encoding = self.encoder.encode(&var);
        for piece in &encoding.pieces {
            self.model.declare_piece(piece.id, piece.max);
        }
        debug!(var = %key, bound, pieces = encoding.pieces.len(), "declared variable");
        self.encodings.insert(key, encoding);
        Ok(var)
    }

    pub fn declare_binary(&mut self, key: VarKey) -> Result<Variable> {
        self.declare(key, 1)
    }

    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Adds objective terms, scaled by the configured objective weight.
    pub fn add_objective(&mut self, expr: LinearExpr) -> Result<()> {
        expr.check_declared(&self.registry)?;
        let lowered = PieceExpr::lower(&expr, &self.encodings)?;
        for (&piece, &c) in lowered.terms() {
            let scaled = checked_product(&[self.config.objective_weight, c], &piece)?;
            self.model.add_linear(piece, scaled)?;
        }
        for &(key, c) in expr.terms() {
            self.objective.push(key, c);
        }
        Ok(())
    }

    /// Expands a penalty block and merges it into the model.
    ///
    /// `AtMost` blocks get a fresh slack variable with bound
    /// `target − min(expr)`.
    ///
    /// # Errors
    /// `UnknownVariable` for undeclared keys, `InvalidDomain` when an
    /// `AtMost` block cannot be met even at its minimum,
    /// `CoefficientOverflow` naming the block when an expanded coefficient
    /// leaves `i64`, plus whatever [`PenaltyBlock::validate`] reports.
    pub fn add_block(&mut self, block: PenaltyBlock) -> Result<()> {
        block.validate()?;
        block.expr().check_declared(&self.registry)?;
        let in_block = |err: QuboError| match err {
            QuboError::CoefficientOverflow { context } => QuboError::CoefficientOverflow {
                context: format!("block `{}`: {context}", block.label()),
            },
            other => other,
        };
        let mut lowered = PieceExpr::lower(block.expr(), &self.encodings).map_err(in_block)?;

        let (contribution, slack) = match block.kind() {
            BlockKind::OneHot | BlockKind::Equality => (
                expand_squared(&lowered, block.target(), block.weight()).map_err(in_block)?,
                None,
            ),
            BlockKind::AtMost => {
                let min = block.expr().min_value(&self.registry).map_err(in_block)?;
                let slack_bound = block.target().checked_sub(min).ok_or_else(|| {
                    QuboError::CoefficientOverflow {
                        context: format!("slack bound of block `{}`", block.label()),
                    }
                })?;
                if slack_bound < 0 {
                    return Err(QuboError::InvalidDomain {
                        bound: slack_bound,
                        reason: format!(
                            "block `{}` needs at least {min} but allows {}",
                            block.label(),
                            block.target()
                        ),
                    });
                }
                let key = self.fresh_slack();
                self.declare(key, slack_bound)?;
                let encoding = self
                    .encodings
                    .get(&key)
                    .ok_or(QuboError::UnknownVariable(key))?;
                lowered.add_encoded(encoding, 1).map_err(in_block)?;
                (
                    expand_squared(&lowered, block.target(), block.weight())
                        .map_err(in_block)?,
                    Some(key),
                )
            }
            BlockKind::Linking { gate } => {
                let encoding = self
                    .encodings
                    .get(&gate)
                    .ok_or(QuboError::UnknownVariable(gate))?;
                let gate_piece = match encoding.pieces.as_slice() {
                    [piece] => *piece,
                    _ => {
                        return Err(QuboError::InvalidProblem(format!(
                            "linking gate {gate} must be a binary flag"
                        )))
                    }
                };
                (
                    expand_linking(&lowered, &gate_piece, block.weight()).map_err(in_block)?,
                    None,
                )
            }
        };

        debug!(
            block = block.label(),
            kind = ?block.kind(),
            pieces = lowered.len(),
            interactions = contribution.num_interactions(),
            "expanded penalty block"
        );
        self.model.merge(&contribution).map_err(in_block)?;
        self.blocks.push(CompiledBlock { block, slack });
        Ok(())
    }

    fn fresh_slack(&mut self) -> VarKey {
        while self.registry.contains(&VarKey::Slack(self.next_slack)) {
            self.next_slack += 1;
        }
        let key = VarKey::Slack(self.next_slack);
        self.next_slack += 1;
        key
    }

    /// Freezes the model.
    ///
    /// Logs a warning for every block whose weight does not dominate the
    /// objective.
    pub fn finish(self) -> Compiled {
        let compiled = Compiled {
            config: self.config,
            registry: self.registry,
            encodings: self.encodings,
            model: self.model,
            objective: self.objective,
            blocks: self.blocks,
        };
        let calibration = compiled.calibration();
        for (label, weight) in &calibration.undersized {
            warn!(
                block = %label,
                weight,
                required = calibration.required_weight(),
                "penalty weight does not dominate the objective"
            );
        }
        info!(
            event = "compile_end",
            variables = compiled.registry.len(),
            pieces = compiled.model.num_pieces(),
            interactions = compiled.model.num_interactions(),
            blocks = compiled.blocks.len(),
        );
        compiled
    }
}

/// Penalty-weight report against the sufficient condition
/// `A > B·max|objective coefficient|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calibration {
    /// Objective weight `B`.
    pub objective_weight: i64,
    /// Largest objective coefficient magnitude.
    pub max_objective_coefficient: i64,
    /// Blocks (label, weight) failing the condition.
    pub undersized: Vec<(String, i64)>,
}

impl Calibration {
    /// Smallest weight satisfying the condition.
    pub fn required_weight(&self) -> i64 {
        self.objective_weight
            .saturating_mul(self.max_objective_coefficient)
            .saturating_add(1)
    }

    pub fn is_sufficient(&self) -> bool {
        self.undersized.is_empty()
    }
}

/// A finished compilation: the model plus everything needed to decode and
/// check a solver's answer.
#[derive(Debug, Clone)]
pub struct Compiled {
    config: CompileConfig,
    registry: VariableRegistry,
    encodings: BTreeMap<VarKey, Encoding>,
    model: QuadraticModel,
    objective: LinearExpr,
    blocks: Vec<CompiledBlock>,
}

impl Compiled {
    pub fn model(&self) -> &QuadraticModel {
        &self.model
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    pub fn encodings(&self) -> &BTreeMap<VarKey, Encoding> {
        &self.encodings
    }

    pub fn encoding(&self, key: &VarKey) -> Option<&Encoding> {
        self.encodings.get(key)
    }

    /// Variables in declaration order, slack included.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.registry.iter()
    }

    pub fn blocks(&self) -> &[CompiledBlock] {
        &self.blocks
    }

    /// Objective terms, before scaling by the objective weight.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Unscaled objective at decoded values.
    pub fn objective_value(&self, values: &BTreeMap<VarKey, u64>) -> Option<i64> {
        self.objective.evaluate(values)
    }

    pub fn calibration(&self) -> Calibration {
        let max_objective_coefficient = self.objective.max_abs_coefficient();
        let required = self
            .config
            .objective_weight
            .saturating_mul(max_objective_coefficient);
        let undersized = self
            .blocks
            .iter()
            .filter(|b| b.block.weight() <= required)
            .map(|b| (b.block.label().to_string(), b.block.weight()))
            .collect();
        Calibration {
            objective_weight: self.config.objective_weight,
            max_objective_coefficient,
            undersized,
        }
    }

    /// Piece values representing the given variable values.
    ///
    /// Variables without a value are set to 0.
    pub fn assignment_for(&self, values: &BTreeMap<VarKey, u64>) -> Result<BTreeMap<PieceId, u64>> {
        let mut raw = BTreeMap::new();
        for (key, encoding) in &self.encodings {
            let value = values.get(key).copied().unwrap_or(0);
            raw.extend(encoding.assign(value)?);
        }
        Ok(raw)
    }

    /// Post-solve constraint check.
    ///
    /// # Errors
    /// `MiscalibratedPenalty` naming the first violated block.
    pub fn verify(&self, solution: &Solution) -> Result<()> {
        for compiled in &self.blocks {
            let block = &compiled.block;
            if block.is_satisfied(&solution.values) != Some(true) {
                return Err(QuboError::MiscalibratedPenalty {
                    block: block.label().to_string(),
                    energy: solution.energy,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::EncodingMode;
    use crate::solve::{ExactSolver, SolveParams, SolverAdapter};

    fn two_supplier_compiler() -> Compiler {
        let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
        compiler.declare_binary(VarKey::Supplier(0)).unwrap();
        compiler.declare_binary(VarKey::Supplier(1)).unwrap();
        compiler
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Compiler::new(CompileConfig::default().with_objective_weight(-1)).unwrap_err();
        assert!(matches!(err, QuboError::InvalidConfig(_)));
    }

    #[test]
    fn test_duplicate_declaration_aborts() {
        let mut compiler = two_supplier_compiler();
        assert!(matches!(
            compiler.declare_binary(VarKey::Supplier(0)),
            Err(QuboError::DuplicateVariable(_))
        ));
    }

    #[test]
    fn test_undeclared_block_key() {
        let mut compiler = two_supplier_compiler();
        let err = compiler
            .add_block(PenaltyBlock::one_hot(
                "bad",
                [VarKey::Supplier(0), VarKey::Supplier(7)],
                1,
            ))
            .unwrap_err();
        assert!(matches!(err, QuboError::UnknownVariable(VarKey::Supplier(7))));
    }

    #[test]
    fn test_at_most_allocates_slack() {
        let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
        compiler.declare_binary(VarKey::Item(0)).unwrap();
        compiler.declare_binary(VarKey::Item(1)).unwrap();
        compiler
            .add_block(PenaltyBlock::at_most(
                "budget",
                LinearExpr::new()
                    .term(VarKey::Item(0), 6)
                    .term(VarKey::Item(1), 5),
                10,
                6,
            ))
            .unwrap();
        let compiled = compiler.finish();

        let block = &compiled.blocks()[0];
        assert_eq!(block.slack, Some(VarKey::Slack(0)));
        let slack = compiled.encoding(&VarKey::Slack(0)).unwrap();
        assert_eq!(slack.bound, 10);
        assert_eq!(slack.pieces.len(), 4);
        assert_eq!(compiled.model().num_pieces(), 6);
    }

    #[test]
    fn test_slack_skips_taken_keys() {
        let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
        compiler.declare(VarKey::Slack(0), 3).unwrap();
        compiler
            .add_block(PenaltyBlock::at_most(
                "cap",
                LinearExpr::sum([VarKey::Slack(0)]),
                2,
                1,
            ))
            .unwrap();
        assert_eq!(compiler.finish().blocks()[0].slack, Some(VarKey::Slack(1)));
    }

    #[test]
    fn test_unsatisfiable_at_most() {
        let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
        compiler.declare(VarKey::Item(0), 3).unwrap();
        let err = compiler
            .add_block(PenaltyBlock::at_most(
                "impossible",
                LinearExpr::new().term(VarKey::Item(0), -2),
                -7,
                1,
            ))
            .unwrap_err();
        assert!(matches!(err, QuboError::InvalidDomain { bound: -1, .. }));
    }

    #[test]
    fn test_linking_gate_must_be_binary() {
        let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
        compiler.declare(VarKey::Supplier(0), 2).unwrap();
        compiler.declare(VarKey::Item(0), 1).unwrap();
        let err = compiler
            .add_block(PenaltyBlock::linking(
                "link",
                LinearExpr::sum([VarKey::Item(0)]),
                VarKey::Supplier(0),
                3,
            ))
            .unwrap_err();
        assert!(matches!(err, QuboError::InvalidProblem(_)));
    }

    #[test]
    fn test_objective_is_scaled() {
        let mut compiler =
            Compiler::new(CompileConfig::default().with_objective_weight(3)).unwrap();
        compiler.declare(VarKey::Item(0), 2).unwrap();
        compiler
            .add_objective(LinearExpr::new().term(VarKey::Item(0), -5))
            .unwrap();
        let compiled = compiler.finish();
        let weights: Vec<i64> = compiled.model().linear().values().copied().collect();
        // bound 2 → pieces weighing 1 and 1
        assert_eq!(weights, vec![-15, -15]);
        assert_eq!(compiled.calibration().max_objective_coefficient, 5);
    }

    #[test]
    fn test_calibration_flags_small_weights() {
        let mut compiler = two_supplier_compiler();
        compiler
            .add_objective(
                LinearExpr::new()
                    .term(VarKey::Supplier(0), 4)
                    .term(VarKey::Supplier(1), 1),
            )
            .unwrap();
        compiler
            .add_block(PenaltyBlock::one_hot(
                "weak",
                [VarKey::Supplier(0), VarKey::Supplier(1)],
                4,
            ))
            .unwrap();
        compiler
            .add_block(PenaltyBlock::one_hot(
                "strong",
                [VarKey::Supplier(0), VarKey::Supplier(1)],
                5,
            ))
            .unwrap();
        let calibration = compiler.finish().calibration();
        assert_eq!(calibration.required_weight(), 5);
        assert_eq!(calibration.undersized, vec![("weak".to_string(), 4)]);
        assert!(!calibration.is_sufficient());
    }

    #[test]
    fn test_block_order_does_not_matter() {
        let blocks = || {
            vec![
                PenaltyBlock::one_hot("oh", [VarKey::Item(0), VarKey::Item(1)], 3),
                PenaltyBlock::at_most(
                    "cap",
                    LinearExpr::new()
                        .term(VarKey::Item(0), 2)
                        .term(VarKey::Item(2), 3),
                    4,
                    5,
                ),
                PenaltyBlock::linking(
                    "link",
                    LinearExpr::sum([VarKey::Item(2)]),
                    VarKey::Item(1),
                    7,
                ),
            ]
        };
        let build = |order: &[usize]| {
            let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
            compiler.declare_binary(VarKey::Item(0)).unwrap();
            compiler.declare_binary(VarKey::Item(1)).unwrap();
            compiler.declare(VarKey::Item(2), 2).unwrap();
            let all = blocks();
            for &i in order {
                compiler.add_block(all[i].clone()).unwrap();
            }
            compiler.finish().model().clone()
        };
        assert_eq!(build(&[0, 1, 2]), build(&[2, 1, 0]));
        assert_eq!(build(&[0, 1, 2]), build(&[1, 0, 2]));
    }

    #[test]
    fn test_assignment_round_trip() {
        let mut compiler =
            Compiler::new(CompileConfig::default().with_encoding(EncodingMode::Binary)).unwrap();
        compiler.declare(VarKey::Item(0), 13).unwrap();
        compiler.declare_binary(VarKey::Supplier(0)).unwrap();
        let compiled = compiler.finish();

        for v in 0..=13u64 {
            let values = BTreeMap::from([(VarKey::Item(0), v), (VarKey::Supplier(0), 1)]);
            let raw = compiled.assignment_for(&values).unwrap();
            let enc = compiled.encoding(&VarKey::Item(0)).unwrap();
            assert_eq!(enc.value_of(&raw).unwrap(), v);
        }
    }

    #[test]
    fn test_cheaper_supplier_beats_every_alternative() {
        let mut compiler = two_supplier_compiler();
        compiler
            .add_objective(LinearExpr::new().term(VarKey::Supplier(0), 1))
            .unwrap();
        compiler
            .add_block(PenaltyBlock::one_hot(
                "one supplier",
                [VarKey::Supplier(0), VarKey::Supplier(1)],
                2,
            ))
            .unwrap();
        let compiled = compiler.finish();

        let solution =
            SolverAdapter::solve(&compiled, &ExactSolver::new(), &SolveParams::default()).unwrap();
        assert_eq!(solution.value(&VarKey::Supplier(0)), Some(0));
        assert_eq!(solution.value(&VarKey::Supplier(1)), Some(1));
        assert_eq!(solution.energy, -2);

        let energy_of = |s0: u64, s1: u64| {
            let values = BTreeMap::from([(VarKey::Supplier(0), s0), (VarKey::Supplier(1), s1)]);
            compiled
                .model()
                .energy(&compiled.assignment_for(&values).unwrap())
                .unwrap()
        };
        assert_eq!(energy_of(0, 1), solution.energy);
        for (s0, s1, expected) in [(0, 0, 0), (1, 1, 1), (1, 0, -1)] {
            let energy = energy_of(s0, s1);
            assert_eq!(energy, expected);
            assert!(solution.energy < energy, "({s0}, {s1}) has energy {energy}");
        }
    }

    #[test]
    fn test_objective_overflow_aborts() {
        let mut compiler =
            Compiler::new(CompileConfig::default().with_objective_weight(i64::MAX / 2)).unwrap();
        compiler.declare_binary(VarKey::Item(0)).unwrap();
        let err = compiler
            .add_objective(LinearExpr::new().term(VarKey::Item(0), 3))
            .unwrap_err();
        assert!(matches!(err, QuboError::CoefficientOverflow { .. }));
    }

    #[test]
    fn test_block_overflow_names_block() {
        let mut compiler = Compiler::new(CompileConfig::default()).unwrap();
        compiler.declare_binary(VarKey::Item(0)).unwrap();
        let err = compiler
            .add_block(PenaltyBlock::at_most(
                "budget",
                LinearExpr::new().term(VarKey::Item(0), 3_000_000_000),
                4_000_000_000,
                1_001,
            ))
            .unwrap_err();
        match err {
            QuboError::CoefficientOverflow { context } => {
                assert!(context.contains("budget"), "{context}")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
