//! Dense index over a model for in-process solvers.

use std::collections::{BTreeMap, HashMap};

use crate::error::{QuboError, Result};
use crate::model::QuadraticModel;
use crate::registry::PieceId;

/// Adjacency-list view of a [`QuadraticModel`].
///
/// Piece `i` is the i-th key of the model's domain map, so the layout is
/// deterministic. Construction checks that no state's energy magnitude
/// exceeds `i64::MAX / 2`, so `energy`, `delta` and `max_abs_delta` work
/// in plain `i64`.
#[derive(Debug, Clone)]
pub(crate) struct IndexedModel {
    pub pieces: Vec<PieceId>,
    pub domains: Vec<u64>,
    pub linear: Vec<i64>,
    pub squared: Vec<i64>,
    /// Symmetric: `(j, q)` in `neighbors[i]` iff `(i, q)` in `neighbors[j]`.
    pub neighbors: Vec<Vec<(usize, i64)>>,
}

impl IndexedModel {
    pub fn new(model: &QuadraticModel) -> Result<Self> {
        check_energy_range(model)?;
        let pieces: Vec<PieceId> = model.domains().keys().copied().collect();
        let position: HashMap<PieceId, usize> =
            pieces.iter().enumerate().map(|(i, &p)| (p, i)).collect();
        let n = pieces.len();

        let domains = model.domains().values().copied().collect();
        let mut linear = vec![0i64; n];
        for (p, &c) in model.linear() {
            linear[position[p]] += c;
        }
        let mut squared = vec![0i64; n];
        for (p, &c) in model.squared() {
            squared[position[p]] += c;
        }
        let mut neighbors = vec![Vec::new(); n];
        for ((a, b), &c) in model.quadratic() {
            let (i, j) = (position[a], position[b]);
            neighbors[i].push((j, c));
            neighbors[j].push((i, c));
        }

        Ok(Self {
            pieces,
            domains,
            linear,
            squared,
            neighbors,
        })
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn energy(&self, state: &[u64]) -> i64 {
        let mut energy = 0i64;
        for i in 0..self.len() {
            let x = state[i] as i64;
            energy += self.linear[i] * x + self.squared[i] * x * x;
            for &(j, q) in &self.neighbors[i] {
                if j > i {
                    energy += q * x * state[j] as i64;
                }
            }
        }
        energy
    }

    /// Energy change from setting piece `i` to `value`.
    pub fn delta(&self, state: &[u64], i: usize, value: u64) -> i64 {
        let old = state[i] as i64;
        let new = value as i64;
        let d = new - old;
        let field: i64 = self.neighbors[i]
            .iter()
            .map(|&(j, q)| q * state[j] as i64)
            .sum();
        self.linear[i] * d + self.squared[i] * (new * new - old * old) + d * field
    }

    /// Largest energy change a single move can cause.
    pub fn max_abs_delta(&self) -> i64 {
        (0..self.len())
            .map(|i| {
                let m = self.domains[i] as i64;
                let own = self.linear[i].abs() * m + self.squared[i].abs() * m * m;
                let coupled: i64 = self.neighbors[i]
                    .iter()
                    .map(|&(j, q)| q.abs() * m * self.domains[j] as i64)
                    .sum();
                own + coupled
            })
            .max()
            .unwrap_or(0)
    }

    /// Smallest non-zero coefficient magnitude.
    pub fn min_abs_coefficient(&self) -> i64 {
        self.linear
            .iter()
            .chain(self.squared.iter())
            .chain(self.neighbors.iter().flatten().map(|(_, q)| q))
            .map(|c| c.abs())
            .filter(|&c| c > 0)
            .min()
            .unwrap_or(0)
    }

    pub fn to_assignment(&self, state: &[u64]) -> BTreeMap<PieceId, u64> {
        self.pieces.iter().copied().zip(state.iter().copied()).collect()
    }
}

/// Fails unless `Σ|c|·max` over every term stays within `i64::MAX / 2`.
fn check_energy_range(model: &QuadraticModel) -> Result<()> {
    let max = |p: &PieceId| i128::from(model.domain_of(p).unwrap_or(1));
    let mut terms = model
        .linear()
        .iter()
        .map(|(p, &c)| (c, max(p), 1))
        .chain(model.squared().iter().map(|(p, &c)| (c, max(p), max(p))))
        .chain(
            model
                .quadratic()
                .iter()
                .map(|((a, b), &c)| (c, max(a), max(b))),
        );
    let bound = terms.try_fold(0i128, |acc, (c, x, y)| {
        i128::from(c)
            .abs()
            .checked_mul(x)?
            .checked_mul(y)?
            .checked_add(acc)
    });
    match bound {
        Some(b) if b <= i128::from(i64::MAX / 2) => Ok(()),
        _ => Err(QuboError::CoefficientOverflow {
            context: "energy range of model".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VarKey;

    fn sample_model() -> QuadraticModel {
        let p = |n| PieceId::new(VarKey::Aux(n), 0);
        let mut model = QuadraticModel::new();
        model.declare_piece(p(2), 3);
        model.add_linear(p(0), -2).unwrap();
        model.add_linear(p(1), 1).unwrap();
        model.add_linear(p(2), -4).unwrap();
        model.add_squared(p(2), 1).unwrap();
        model.add_quadratic(p(0), p(1), 3).unwrap();
        model.add_quadratic(p(1), p(2), -1).unwrap();
        model
    }

    #[test]
    fn test_energy_matches_model() {
        let model = sample_model();
        let indexed = IndexedModel::new(&model).unwrap();
        for a in 0..=1u64 {
            for b in 0..=1u64 {
                for c in 0..=3u64 {
                    let state = vec![a, b, c];
                    let raw = indexed.to_assignment(&state);
                    assert_eq!(indexed.energy(&state), model.energy(&raw).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_delta_matches_energy_difference() {
        let indexed = IndexedModel::new(&sample_model()).unwrap();
        let state = vec![1, 1, 2];
        for i in 0..3 {
            for value in 0..=indexed.domains[i] {
                let mut next = state.clone();
                next[i] = value;
                assert_eq!(
                    indexed.delta(&state, i, value),
                    indexed.energy(&next) - indexed.energy(&state)
                );
            }
        }
    }

    #[test]
    fn test_coefficient_extremes() {
        let indexed = IndexedModel::new(&sample_model()).unwrap();
        assert_eq!(indexed.min_abs_coefficient(), 1);
        // piece 2: |−4|·3 + |1|·9 + |−1|·3·1
        assert_eq!(indexed.max_abs_delta(), 24);
    }

    #[test]
    fn test_energy_range_checked() {
        let p = |n| PieceId::new(VarKey::Aux(n), 0);
        let mut model = QuadraticModel::new();
        model.declare_piece(p(0), 1 << 20);
        model.add_squared(p(0), 1 << 30).unwrap();
        assert!(matches!(
            IndexedModel::new(&model),
            Err(QuboError::CoefficientOverflow { .. })
        ));

        let mut fits = QuadraticModel::new();
        fits.add_linear(p(0), i64::MAX / 4).unwrap();
        fits.add_linear(p(1), i64::MAX / 4).unwrap();
        assert!(IndexedModel::new(&fits).is_ok());
    }
}
