//! Penalty block definitions.

use std::collections::BTreeMap;

use super::expr::LinearExpr;
use crate::error::{QuboError, Result};
use crate::registry::VarKey;

/// The constraint shape a block penalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockKind {
    /// Exactly one of a set of flags is set: `A·(Σ x − 1)²`.
    OneHot,

    /// `A·(expr − target)²`.
    Equality,

    /// `expr ≤ target`, rewritten as `A·(expr + slack − target)²`.
    ///
    /// The compiler allocates and encodes the slack.
    AtMost,

    /// `expr > 0` only when `gate` is set: `A·expr·(1 − gate)`.
    ///
    /// Requires a binary gate and non-negative coefficients, which keeps
    /// the penalty zero when satisfied and at least `A` otherwise.
    Linking {
        /// Binary flag that unlocks the expression.
        gate: VarKey,
    },
}

/// One constraint instance with its Lagrange weight.
///
/// # Examples
///
/// ```
/// use u_qubo::penalty::{LinearExpr, PenaltyBlock};
/// use u_qubo::registry::VarKey;
///
/// let choose_one = PenaltyBlock::one_hot(
///     "one supplier",
///     [VarKey::Supplier(0), VarKey::Supplier(1)],
///     2,
/// );
/// assert_eq!(choose_one.target(), 1);
///
/// let budget = PenaltyBlock::at_most(
///     "budget",
///     LinearExpr::new().term(VarKey::Item(0), 6).term(VarKey::Item(1), 5),
///     10,
///     6,
/// );
/// assert!(budget.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PenaltyBlock {
    label: String,
    kind: BlockKind,
    expr: LinearExpr,
    target: i64,
    weight: i64,
}

impl PenaltyBlock {
    pub fn one_hot(
        label: impl Into<String>,
        keys: impl IntoIterator<Item = VarKey>,
        weight: i64,
    ) -> Self {
        Self {
            label: label.into(),
            kind: BlockKind::OneHot,
            expr: LinearExpr::sum(keys),
            target: 1,
            weight,
        }
    }

    pub fn equality(label: impl Into<String>, expr: LinearExpr, total: i64, weight: i64) -> Self {
        Self {
            label: label.into(),
            kind: BlockKind::Equality,
            expr,
            target: total,
            weight,
        }
    }

    pub fn at_most(label: impl Into<String>, expr: LinearExpr, bound: i64, weight: i64) -> Self {
        Self {
            label: label.into(),
            kind: BlockKind::AtMost,
            expr,
            target: bound,
            weight,
        }
    }

    pub fn linking(label: impl Into<String>, expr: LinearExpr, gate: VarKey, weight: i64) -> Self {
        Self {
            label: label.into(),
            kind: BlockKind::Linking { gate },
            expr,
            target: 0,
            weight,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn expr(&self) -> &LinearExpr {
        &self.expr
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    /// Lagrange weight `A`.
    pub fn weight(&self) -> i64 {
        self.weight
    }

    /// Checks the block's shape independently of any registry.
    pub fn validate(&self) -> Result<()> {
        if self.weight <= 0 {
            return Err(QuboError::InvalidConfig(format!(
                "block `{}`: weight must be positive, got {}",
                self.label, self.weight
            )));
        }
        if self.expr.is_empty() && self.kind == BlockKind::OneHot {
            return Err(QuboError::InvalidProblem(format!(
                "block `{}`: one-hot over an empty set can never be satisfied",
                self.label
            )));
        }
        if let BlockKind::Linking { gate } = self.kind {
            if let Some(&(key, c)) = self.expr.terms().iter().find(|&&(_, c)| c < 0) {
                return Err(QuboError::InvalidProblem(format!(
                    "block `{}`: linking coefficient {c} on {key} must be non-negative",
                    self.label
                )));
            }
            if self.expr.keys().any(|k| k == gate) {
                return Err(QuboError::InvalidProblem(format!(
                    "block `{}`: gate {gate} also appears in the gated expression",
                    self.label
                )));
            }
        }
        Ok(())
    }

    /// Whether the constraint holds on decoded variable values.
    ///
    /// Returns `None` if a referenced variable has no value.
    pub fn is_satisfied(&self, values: &BTreeMap<VarKey, u64>) -> Option<bool> {
        let lhs = self.expr.evaluate(values)?;
        Some(match self.kind {
            BlockKind::OneHot | BlockKind::Equality => lhs == self.target,
            BlockKind::AtMost => lhs <= self.target,
            BlockKind::Linking { gate } => lhs == 0 || *values.get(&gate)? == 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_weight_rejected() {
        let block = PenaltyBlock::one_hot("x", [VarKey::Item(0)], 0);
        assert!(matches!(block.validate(), Err(QuboError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_one_hot_rejected() {
        let block = PenaltyBlock::one_hot("empty", [], 3);
        assert!(matches!(block.validate(), Err(QuboError::InvalidProblem(_))));
    }

    #[test]
    fn test_linking_shape() {
        let bad = PenaltyBlock::linking(
            "neg",
            LinearExpr::new().term(VarKey::Item(0), -1),
            VarKey::Supplier(0),
            5,
        );
        assert!(bad.validate().is_err());

        let gated_self = PenaltyBlock::linking(
            "self",
            LinearExpr::sum([VarKey::Supplier(0)]),
            VarKey::Supplier(0),
            5,
        );
        assert!(gated_self.validate().is_err());
    }

    #[test]
    fn test_is_satisfied() {
        let values = BTreeMap::from([
            (VarKey::Item(0), 1),
            (VarKey::Item(1), 0),
            (VarKey::Supplier(0), 0),
        ]);

        let one_hot = PenaltyBlock::one_hot("oh", [VarKey::Item(0), VarKey::Item(1)], 1);
        assert_eq!(one_hot.is_satisfied(&values), Some(true));

        let at_most = PenaltyBlock::at_most(
            "cap",
            LinearExpr::new().term(VarKey::Item(0), 6),
            5,
            1,
        );
        assert_eq!(at_most.is_satisfied(&values), Some(false));

        let link = PenaltyBlock::linking(
            "link",
            LinearExpr::sum([VarKey::Item(0)]),
            VarKey::Supplier(0),
            1,
        );
        assert_eq!(link.is_satisfied(&values), Some(false));

        let missing = PenaltyBlock::equality("eq", LinearExpr::sum([VarKey::Aux(9)]), 0, 1);
        assert_eq!(missing.is_satisfied(&values), None);
    }
}
