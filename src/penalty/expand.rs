//! Squared-penalty and linking expansion.

use std::collections::BTreeMap;

use super::expr::LinearExpr;
use crate::encode::{Encoding, Piece};
use crate::error::{QuboError, Result};
use crate::model::{checked_product, QuadraticModel};
use crate::registry::{PieceId, VarKey};

/// A linear expression lowered to pieces.
///
/// Coefficients are merged by piece identity: two terms on the same
/// variable land on the same pieces and add up, while different tiers of
/// one variable stay separate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceExpr {
    terms: BTreeMap<PieceId, i64>,
    domains: BTreeMap<PieceId, u64>,
}

impl PieceExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coefficient · weight · piece`.
    ///
    /// # Errors
    /// `CoefficientOverflow` if the merged coefficient leaves `i64`.
    pub fn add(&mut self, piece: &Piece, coefficient: i64) -> Result<()> {
        let scaled = checked_product(&[coefficient, piece.weight], &piece.id)?;
        let entry = self.terms.entry(piece.id).or_insert(0);
        *entry = entry
            .checked_add(scaled)
            .ok_or_else(|| QuboError::CoefficientOverflow {
                context: format!("coefficient of {}", piece.id),
            })?;
        self.domains.insert(piece.id, piece.max);
        Ok(())
    }

    /// Adds `coefficient · var` through its encoding.
    pub fn add_encoded(&mut self, encoding: &Encoding, coefficient: i64) -> Result<()> {
        for piece in &encoding.pieces {
            self.add(piece, coefficient)?;
        }
        Ok(())
    }

    /// Lowers a variable-level expression.
    ///
    /// # Errors
    /// `UnknownVariable` if a key has no encoding.
    pub fn lower(expr: &LinearExpr, encodings: &BTreeMap<VarKey, Encoding>) -> Result<Self> {
        let mut lowered = Self::new();
        for &(key, c) in expr.terms() {
            let encoding = encodings
                .get(&key)
                .ok_or(QuboError::UnknownVariable(key))?;
            lowered.add_encoded(encoding, c)?;
        }
        Ok(lowered)
    }

    pub fn terms(&self) -> &BTreeMap<PieceId, i64> {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value at a raw piece assignment, or `None` if a piece is missing or
    /// the sum leaves `i64`.
    pub fn evaluate(&self, raw: &BTreeMap<PieceId, u64>) -> Option<i64> {
        self.terms.iter().try_fold(0i64, |acc, (p, c)| {
            let v = i64::try_from(*raw.get(p)?).ok()?;
            acc.checked_add(c.checked_mul(v)?)
        })
    }

    fn declare_into(&self, model: &mut QuadraticModel) {
        for (&piece, &max) in &self.domains {
            model.declare_piece(piece, max);
        }
    }
}

/// Expands `weight · (Σ cₖ·xₖ − target)²` without its constant term.
///
/// `Σₖ (cₖ²·xₖ² − 2·target·cₖ·xₖ) + 2·Σₖ<ₗ cₖ·cₗ·xₖ·xₗ`, each scaled by
/// `weight`. For binary pieces the `xₖ²` part folds into the linear map.
/// The dropped `weight · target²` shifts every energy equally.
///
/// # Errors
/// `CoefficientOverflow` if a coefficient leaves `i64`.
pub fn expand_squared(expr: &PieceExpr, target: i64, weight: i64) -> Result<QuadraticModel> {
    let mut model = QuadraticModel::new();
    expr.declare_into(&mut model);

    let terms: Vec<(PieceId, i64)> = expr.terms.iter().map(|(&p, &c)| (p, c)).collect();
    for (k, &(piece, c)) in terms.iter().enumerate() {
        model.add_squared(piece, checked_product(&[weight, c, c], &piece)?)?;
        model.add_linear(piece, checked_product(&[-2, weight, target, c], &piece)?)?;
        for &(other, d) in &terms[k + 1..] {
            model.add_quadratic(piece, other, checked_product(&[2, weight, c, d], &piece)?)?;
        }
    }
    Ok(model)
}

/// Expands `weight · (Σ cₖ·xₖ) · (1 − gate)`.
///
/// # Errors
/// `InvalidProblem` for a non-binary gate, `SelfPair` if the gate piece is
/// part of the expression, `CoefficientOverflow` if a coefficient leaves
/// `i64`.
pub fn expand_linking(expr: &PieceExpr, gate: &Piece, weight: i64) -> Result<QuadraticModel> {
    if !gate.is_binary() || gate.weight != 1 {
        return Err(QuboError::InvalidProblem(format!(
            "linking gate {} must be a binary flag",
            gate.id.var
        )));
    }
    let mut model = QuadraticModel::new();
    expr.declare_into(&mut model);
    model.declare_piece(gate.id, 1);

    for (&piece, &c) in &expr.terms {
        model.add_linear(piece, checked_product(&[weight, c], &piece)?)?;
        model.add_quadratic(piece, gate.id, checked_product(&[-1, weight, c], &piece)?)?;
    }
    Ok(model)
}
