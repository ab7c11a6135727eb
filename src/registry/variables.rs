//! Variable declarations and the per-compilation registry.

use std::collections::HashMap;

use super::key::VarKey;
use crate::error::{QuboError, Result};

/// A declared variable taking integer values in `[0, bound]`.
///
/// Binary flags are variables with bound 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    /// Unique key within the compilation.
    pub key: VarKey,
    /// Largest value the variable may take.
    pub bound: u64,
}

impl Variable {
    /// Whether this is a binary flag.
    pub fn is_binary(&self) -> bool {
        self.bound == 1
    }

    /// Domain size (`bound + 1`).
    pub fn domain_size(&self) -> u64 {
        self.bound + 1
    }
}

/// Tracks every variable declared in one compilation.
///
/// Declaration order is preserved so downstream iteration is stable.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    vars: Vec<Variable>,
    index: HashMap<VarKey, usize>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `key` with values in `[0, bound]`.
    ///
    /// # Errors
    /// `DuplicateVariable` if the key is already declared, `InvalidDomain`
    /// if `bound` is negative.
    pub fn declare(&mut self, key: VarKey, bound: i64) -> Result<Variable> {
        if self.index.contains_key(&key) {
            return Err(QuboError::DuplicateVariable(key));
        }
        if bound < 0 {
            return Err(QuboError::InvalidDomain {
                bound,
                reason: format!("{key} must have a non-negative bound"),
            });
        }
        let var = Variable {
            key,
            bound: bound as u64,
        };
        self.index.insert(key, self.vars.len());
        self.vars.push(var);
        Ok(var)
    }

    /// Declares a binary flag.
    pub fn declare_binary(&mut self, key: VarKey) -> Result<Variable> {
        self.declare(key, 1)
    }

    /// Looks up a declared variable.
    pub fn get(&self, key: &VarKey) -> Option<&Variable> {
        self.index.get(key).map(|&i| &self.vars[i])
    }

    /// Bound of a declared variable.
    pub fn bound_of(&self, key: &VarKey) -> Result<u64> {
        self.get(key)
            .map(|v| v.bound)
            .ok_or(QuboError::UnknownVariable(*key))
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.index.contains_key(key)
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
