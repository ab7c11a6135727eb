//! Typed variable and piece keys.

use std::fmt;

/// Identity of a modeled quantity.
///
/// Every problem entity maps to exactly one variant, so two builders can
/// never collide on a key by accident the way concatenated string names
/// can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKey {
    /// An item decision (selection flag or purchase quantity).
    Item(usize),
    /// A supplier (or candidate set) selection flag.
    Supplier(usize),
    /// Quantity of `item` bought from `supplier`.
    Purchase { item: usize, supplier: usize },
    /// "Element is covered exactly `count` times" indicator.
    Coverage { element: usize, count: usize },
    /// Slack of the n-th inequality block.
    Slack(usize),
    /// Free-form variable for hand-built models.
    Aux(usize),
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKey::Item(i) => write!(f, "item[{i}]"),
            VarKey::Supplier(s) => write!(f, "supplier[{s}]"),
            VarKey::Purchase { item, supplier } => write!(f, "purchase[{item},{supplier}]"),
            VarKey::Coverage { element, count } => write!(f, "coverage[{element},{count}]"),
            VarKey::Slack(n) => write!(f, "slack[{n}]"),
            VarKey::Aux(n) => write!(f, "aux[{n}]"),
        }
    }
}

/// One piece of an encoded variable.
///
/// Pieces of the same variable at different tiers are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceId {
    /// Originating variable.
    pub var: VarKey,
    /// Position in the variable's encoding (0 = lowest weight tier).
    pub tier: u8,
}

impl PieceId {
    pub fn new(var: VarKey, tier: u8) -> Self {
        Self { var, tier }
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.var, self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(VarKey::Item(3).to_string(), "item[3]");
        assert_eq!(
            VarKey::Purchase {
                item: 1,
                supplier: 2
            }
            .to_string(),
            "purchase[1,2]"
        );
        assert_eq!(PieceId::new(VarKey::Slack(0), 2).to_string(), "slack[0]#2");
    }

    #[test]
    fn test_piece_ordering_groups_by_variable() {
        let a0 = PieceId::new(VarKey::Item(0), 0);
        let a1 = PieceId::new(VarKey::Item(0), 1);
        let b0 = PieceId::new(VarKey::Item(1), 0);
        let mut v = vec![b0, a1, a0];
        v.sort();
        assert_eq!(v, vec![a0, a1, b0]);
    }
}
