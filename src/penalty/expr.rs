//! Linear expressions over declared variables.

use std::collections::BTreeMap;

use crate::error::{QuboError, Result};
use crate::registry::{VarKey, VariableRegistry};

/// `Σ cᵢ·xᵢ` over declared variables.
///
/// Terms are kept in insertion order; a key may appear more than once and
/// its coefficients add up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearExpr {
    terms: Vec<(VarKey, i64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of `keys`, each with coefficient 1.
    pub fn sum(keys: impl IntoIterator<Item = VarKey>) -> Self {
        keys.into_iter().map(|k| (k, 1)).collect()
    }

    /// Builder form of [`push`](Self::push).
    pub fn term(mut self, key: VarKey, coefficient: i64) -> Self {
        self.push(key, coefficient);
        self
    }

    pub fn push(&mut self, key: VarKey, coefficient: i64) {
        self.terms.push((key, coefficient));
    }

    pub fn terms(&self) -> &[(VarKey, i64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = VarKey> + '_ {
        self.terms.iter().map(|&(k, _)| k)
    }

    /// Value at a concrete assignment, or `None` if a key has no value or
    /// the sum leaves `i64`.
    pub fn evaluate(&self, values: &BTreeMap<VarKey, u64>) -> Option<i64> {
        self.terms.iter().try_fold(0i64, |acc, (k, c)| {
            let v = i64::try_from(*values.get(k)?).ok()?;
            acc.checked_add(c.checked_mul(v)?)
        })
    }

    /// Smallest value over the declared domains.
    pub fn min_value(&self, registry: &VariableRegistry) -> Result<i64> {
        self.extreme(registry, |c| c < 0)
    }

    /// Largest value over the declared domains.
    pub fn max_value(&self, registry: &VariableRegistry) -> Result<i64> {
        self.extreme(registry, |c| c > 0)
    }

    fn extreme(&self, registry: &VariableRegistry, take: impl Fn(i64) -> bool) -> Result<i64> {
        let mut total = 0i64;
        for (key, c) in &self.terms {
            let bound = registry.bound_of(key)?;
            if take(*c) {
                total = c
                    .checked_mul(bound as i64)
                    .and_then(|t| total.checked_add(t))
                    .ok_or_else(|| QuboError::CoefficientOverflow {
                        context: format!("range of expression over {key}"),
                    })?;
            }
        }
        Ok(total)
    }

    /// Largest coefficient magnitude, after merging repeated keys.
    pub fn max_abs_coefficient(&self) -> i64 {
        let mut merged: BTreeMap<VarKey, i64> = BTreeMap::new();
        for &(k, c) in &self.terms {
            let entry = merged.entry(k).or_insert(0);
            *entry = entry.saturating_add(c);
        }
        merged.values().map(|c| c.saturating_abs()).max().unwrap_or(0)
    }

    /// Fails with `UnknownVariable` for the first undeclared key.
    pub fn check_declared(&self, registry: &VariableRegistry) -> Result<()> {
        match self.keys().find(|k| !registry.contains(k)) {
            Some(k) => Err(QuboError::UnknownVariable(k)),
            None => Ok(()),
        }
    }
}

impl FromIterator<(VarKey, i64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarKey, i64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        let expr = LinearExpr::new()
            .term(VarKey::Item(0), 3)
            .term(VarKey::Item(1), -2)
            .term(VarKey::Item(0), 1);
        let values = BTreeMap::from([(VarKey::Item(0), 2), (VarKey::Item(1), 5)]);
        assert_eq!(expr.evaluate(&values), Some(8 - 10));
        assert_eq!(expr.evaluate(&BTreeMap::new()), None);
    }

    #[test]
    fn test_extremes() {
        let mut reg = VariableRegistry::new();
        reg.declare(VarKey::Item(0), 4).unwrap();
        reg.declare(VarKey::Item(1), 2).unwrap();
        let expr = LinearExpr::new()
            .term(VarKey::Item(0), 3)
            .term(VarKey::Item(1), -5);
        assert_eq!(expr.min_value(&reg).unwrap(), -10);
        assert_eq!(expr.max_value(&reg).unwrap(), 12);
    }

    #[test]
    fn test_extremes_overflow() {
        let mut reg = VariableRegistry::new();
        reg.declare(VarKey::Item(0), 4).unwrap();
        let expr = LinearExpr::new().term(VarKey::Item(0), i64::MAX / 2);
        assert!(matches!(
            expr.max_value(&reg),
            Err(QuboError::CoefficientOverflow { .. })
        ));
        assert_eq!(expr.min_value(&reg).unwrap(), 0);

        let values = BTreeMap::from([(VarKey::Item(0), 4)]);
        assert_eq!(expr.evaluate(&values), None);
    }

    #[test]
    fn test_undeclared_key() {
        let reg = VariableRegistry::new();
        let expr = LinearExpr::sum([VarKey::Supplier(3)]);
        assert!(matches!(
            expr.check_declared(&reg),
            Err(QuboError::UnknownVariable(VarKey::Supplier(3)))
        ));
    }

    #[test]
    fn test_max_abs_merges_repeats() {
        let expr = LinearExpr::new()
            .term(VarKey::Item(0), 4)
            .term(VarKey::Item(0), -3)
            .term(VarKey::Item(1), -2);
        assert_eq!(expr.max_abs_coefficient(), 2);
    }
}
