//! Additive coefficient maps over pieces.

use std::collections::BTreeMap;

use crate::error::{QuboError, Result};
use crate::registry::PieceId;

/// A quadratic model over binary and multi-valued pieces.
///
/// Energy of an assignment `x` is
/// `Σ linear[p]·x_p + Σ squared[p]·x_p² + Σ quadratic[(p, q)]·x_p·x_q`.
///
/// Every `add_*` call accumulates into the existing entry; nothing is ever
/// overwritten or dropped, including entries that sum to zero. Quadratic
/// keys are stored as `(smaller, larger)`.
///
/// # Examples
///
/// ```
/// use u_qubo::model::QuadraticModel;
/// use u_qubo::registry::{PieceId, VarKey};
///
/// let a = PieceId::new(VarKey::Supplier(0), 0);
/// let b = PieceId::new(VarKey::Supplier(1), 0);
///
/// let mut model = QuadraticModel::new();
/// model.add_linear(a, -2).unwrap();
/// model.add_linear(a, -1).unwrap();
/// model.add_quadratic(b, a, 4).unwrap();
///
/// assert_eq!(model.linear()[&a], -3);
/// assert_eq!(model.quadratic()[&(a, b)], 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadraticModel {
    domains: BTreeMap<PieceId, u64>,
    linear: BTreeMap<PieceId, i64>,
    squared: BTreeMap<PieceId, i64>,
    quadratic: BTreeMap<(PieceId, PieceId), i64>,
}

impl QuadraticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a piece with native domain `0..=max`.
    ///
    /// Repeated declarations keep the widest domain.
    pub fn declare_piece(&mut self, piece: PieceId, max: u64) {
        let entry = self.domains.entry(piece).or_insert(max);
        *entry = (*entry).max(max);
    }

    /// Adds `coefficient · x`.
    ///
    /// Undeclared pieces are registered as binary.
    ///
    /// # Errors
    /// `CoefficientOverflow` if the accumulated coefficient leaves `i64`.
    pub fn add_linear(&mut self, piece: PieceId, coefficient: i64) -> Result<()> {
        self.domains.entry(piece).or_insert(1);
        accumulate(&mut self.linear, piece, coefficient, &piece)
    }

    /// Adds `coefficient · x²`.
    ///
    /// For a binary piece `x² = x`, so the term lands in the linear map.
    /// Declare multi-valued pieces before adding squared terms to them.
    pub fn add_squared(&mut self, piece: PieceId, coefficient: i64) -> Result<()> {
        let max = *self.domains.entry(piece).or_insert(1);
        if max <= 1 {
            accumulate(&mut self.linear, piece, coefficient, &piece)
        } else {
            accumulate(&mut self.squared, piece, coefficient, &piece)
        }
    }

    /// Adds `coefficient · a · b` for two distinct pieces.
    ///
    /// # Errors
    /// `SelfPair` when `a == b`; use [`add_squared`](Self::add_squared).
    pub fn add_quadratic(&mut self, a: PieceId, b: PieceId, coefficient: i64) -> Result<()> {
        if a == b {
            return Err(QuboError::SelfPair(a));
        }
        self.domains.entry(a).or_insert(1);
        self.domains.entry(b).or_insert(1);
        let key = if a < b { (a, b) } else { (b, a) };
        accumulate(&mut self.quadratic, key, coefficient, &a)
    }

    /// Accumulates every entry of `other` into `self`.
    ///
    /// On overflow `self` may hold part of `other`; the compilation that
    /// owns it is abandoned anyway.
    pub fn merge(&mut self, other: &QuadraticModel) -> Result<()> {
        for (&piece, &max) in &other.domains {
            self.declare_piece(piece, max);
        }
        for (&piece, &c) in &other.linear {
            accumulate(&mut self.linear, piece, c, &piece)?;
        }
        for (&piece, &c) in &other.squared {
            accumulate(&mut self.squared, piece, c, &piece)?;
        }
        for (&pair, &c) in &other.quadratic {
            accumulate(&mut self.quadratic, pair, c, &pair.0)?;
        }
        Ok(())
    }

    pub fn linear(&self) -> &BTreeMap<PieceId, i64> {
        &self.linear
    }

    /// Coefficients of `x²` for multi-valued pieces. Empty for binary models.
    pub fn squared(&self) -> &BTreeMap<PieceId, i64> {
        &self.squared
    }

    pub fn quadratic(&self) -> &BTreeMap<(PieceId, PieceId), i64> {
        &self.quadratic
    }

    /// Native domain maximum of every piece.
    pub fn domains(&self) -> &BTreeMap<PieceId, u64> {
        &self.domains
    }

    pub fn domain_of(&self, piece: &PieceId) -> Option<u64> {
        self.domains.get(piece).copied()
    }

    pub fn num_pieces(&self) -> usize {
        self.domains.len()
    }

    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    /// Whether every piece is binary.
    pub fn is_binary(&self) -> bool {
        self.domains.values().all(|&max| max <= 1)
    }

    /// Exact energy of an assignment.
    ///
    /// # Errors
    /// `DecodeInconsistency` when a piece is missing from `assignment`,
    /// `CoefficientOverflow` when the energy leaves `i64`.
    pub fn energy(&self, assignment: &BTreeMap<PieceId, u64>) -> Result<i64> {
        let value = |piece: &PieceId| -> Result<i64> {
            let v = *assignment
                .get(piece)
                .ok_or_else(|| QuboError::DecodeInconsistency {
                    piece: *piece,
                    reason: "piece missing from assignment".into(),
                })?;
            i64::try_from(v).map_err(|_| overflow("energy", piece))
        };

        let mut energy = 0i64;
        let mut add = |term: Option<i64>, piece: &PieceId| -> Result<()> {
            energy = term
                .and_then(|t| energy.checked_add(t))
                .ok_or_else(|| overflow("energy", piece))?;
            Ok(())
        };
        for (piece, &c) in &self.linear {
            add(c.checked_mul(value(piece)?), piece)?;
        }
        for (piece, &c) in &self.squared {
            let x = value(piece)?;
            add(c.checked_mul(x).and_then(|t| t.checked_mul(x)), piece)?;
        }
        for ((a, b), &c) in &self.quadratic {
            let (x, y) = (value(a)?, value(b)?);
            add(c.checked_mul(x).and_then(|t| t.checked_mul(y)), a)?;
        }
        Ok(energy)
    }
}

/// Product of `factors`, or `CoefficientOverflow` naming `piece`.
pub(crate) fn checked_product(factors: &[i64], piece: &PieceId) -> Result<i64> {
    factors
        .iter()
        .try_fold(1i64, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| overflow("coefficient", piece))
}

fn accumulate<K: Ord>(
    map: &mut BTreeMap<K, i64>,
    key: K,
    coefficient: i64,
    piece: &PieceId,
) -> Result<()> {
    let entry = map.entry(key).or_insert(0);
    *entry = entry
        .checked_add(coefficient)
        .ok_or_else(|| overflow("coefficient", piece))?;
    Ok(())
}

fn overflow(what: &str, piece: &PieceId) -> QuboError {
    QuboError::CoefficientOverflow {
        context: format!("{what} of {piece}"),
    }
}
