//! Bounded-integer to piece decomposition.

use std::collections::BTreeMap;

use super::config::EncodingMode;
use crate::error::{QuboError, Result};
use crate::registry::{PieceId, VarKey, Variable};

/// One weighted piece of an encoded variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    pub id: PieceId,
    /// Multiplier applied to the piece's value.
    pub weight: i64,
    /// Largest native value of the piece (1 for a binary piece).
    pub max: u64,
}

impl Piece {
    pub fn is_binary(&self) -> bool {
        self.max == 1
    }
}

/// The pieces that together represent one variable.
///
/// Invariant: the weighted piece sums reachable by assigning every piece a
/// value in `0..=max` are exactly `0..=bound`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Encoding {
    pub var: VarKey,
    pub bound: u64,
    pub pieces: Vec<Piece>,
}

impl Encoding {
    /// Recovers the variable's value from raw piece values.
    ///
    /// # Errors
    /// `DecodeInconsistency` when a piece is absent or out of its domain.
    pub fn value_of(&self, raw: &BTreeMap<PieceId, u64>) -> Result<u64> {
        let mut total = 0u64;
        for piece in &self.pieces {
            let value = *raw
                .get(&piece.id)
                .ok_or_else(|| QuboError::DecodeInconsistency {
                    piece: piece.id,
                    reason: "piece missing from solver assignment".into(),
                })?;
            if value > piece.max {
                return Err(QuboError::DecodeInconsistency {
                    piece: piece.id,
                    reason: format!("value {value} exceeds piece domain 0..={}", piece.max),
                });
            }
            total += piece.weight as u64 * value;
        }
        Ok(total)
    }

    /// Piece values representing `value`.
    ///
    /// The binary form sets the remainder tier first when `value` cannot be
    /// reached by the power-of-two tiers alone, then writes the rest in
    /// binary.
    pub fn assign(&self, value: u64) -> Result<Vec<(PieceId, u64)>> {
        if value > self.bound {
            return Err(QuboError::InvalidDomain {
                bound: value as i64,
                reason: format!("{} only spans 0..={}", self.var, self.bound),
            });
        }
        let Some(last) = self.pieces.last() else {
            return Ok(Vec::new());
        };
        if !last.is_binary() {
            return Ok(vec![(last.id, value)]);
        }

        let low_tiers = &self.pieces[..self.pieces.len() - 1];
        let low_span = (1u64 << low_tiers.len()) - 1;
        let (top, mut rest) = if value > low_span {
            (1, value - last.weight as u64)
        } else {
            (0, value)
        };

        let mut out = Vec::with_capacity(self.pieces.len());
        for piece in low_tiers {
            out.push((piece.id, rest & 1));
            rest >>= 1;
        }
        out.push((last.id, top));
        Ok(out)
    }
}

/// Splits bounded variables into pieces.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiecewiseEncoder {
    mode: EncodingMode,
}

impl PiecewiseEncoder {
    pub fn new(mode: EncodingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// Encodes a declared variable.
    pub fn encode(&self, var: &Variable) -> Encoding {
        let pieces = match self.mode {
            EncodingMode::Binary => binary_weights(var.bound)
                .into_iter()
                .enumerate()
                .map(|(tier, weight)| Piece {
                    id: PieceId::new(var.key, tier as u8),
                    weight,
                    max: 1,
                })
                .collect(),
            EncodingMode::Discrete if var.bound == 0 => Vec::new(),
            EncodingMode::Discrete => vec![Piece {
                id: PieceId::new(var.key, 0),
                weight: 1,
                max: var.bound,
            }],
        };
        Encoding {
            var: var.key,
            bound: var.bound,
            pieces,
        }
    }

    /// Encodes `key` with values in `[0, bound]` without a registry.
    pub fn encode_bounded(&self, key: VarKey, bound: i64) -> Result<Encoding> {
        if bound < 0 {
            return Err(QuboError::InvalidDomain {
                bound,
                reason: "bound must be non-negative".into(),
            });
        }
        Ok(self.encode(&Variable {
            key,
            bound: bound as u64,
        }))
    }
}

/// Weights `1, 2, …, 2^(M-1), B + 1 - 2^M` with `M = floor(log2(B))`.
///
/// The final weight absorbs the remainder so the largest sum is exactly `B`.
pub fn binary_weights(bound: u64) -> Vec<i64> {
    if bound == 0 {
        return Vec::new();
    }
    let m = bound.ilog2();
    let mut weights: Vec<i64> = (0..m).map(|k| 1i64 << k).collect();
    weights.push((bound + 1 - (1u64 << m)) as i64);
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn reachable_sums(enc: &Encoding) -> BTreeSet<u64> {
        let mut sums = BTreeSet::from([0u64]);
        for piece in &enc.pieces {
            let mut next = BTreeSet::new();
            for &s in &sums {
                for v in 0..=piece.max {
                    next.insert(s + piece.weight as u64 * v);
                }
            }
            sums = next;
        }
        sums
    }

    #[test]
    fn test_binary_weights_examples() {
        assert!(binary_weights(0).is_empty());
        assert_eq!(binary_weights(1), vec![1]);
        assert_eq!(binary_weights(4), vec![1, 2, 1]);
        assert_eq!(binary_weights(7), vec![1, 2, 4]);
        assert_eq!(binary_weights(10), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_piece_count_is_logarithmic() {
        for bound in 1..200u64 {
            let expected = bound.ilog2() as usize + 1;
            assert_eq!(binary_weights(bound).len(), expected, "bound {bound}");
        }
    }

    #[test]
    fn test_zero_bound_has_no_pieces() {
        let enc = PiecewiseEncoder::default()
            .encode_bounded(VarKey::Item(0), 0)
            .unwrap();
        assert!(enc.pieces.is_empty());
        assert_eq!(enc.value_of(&BTreeMap::new()).unwrap(), 0);
    }

    #[test]
    fn test_negative_bound_rejected() {
        let err = PiecewiseEncoder::default()
            .encode_bounded(VarKey::Item(0), -3)
            .unwrap_err();
        assert!(matches!(err, QuboError::InvalidDomain { bound: -3, .. }));
    }

    #[test]
    fn test_discrete_mode_single_piece() {
        let enc = PiecewiseEncoder::new(EncodingMode::Discrete)
            .encode_bounded(VarKey::Item(2), 9)
            .unwrap();
        assert_eq!(enc.pieces.len(), 1);
        assert_eq!(enc.pieces[0].weight, 1);
        assert_eq!(enc.pieces[0].max, 9);
    }

    #[test]
    fn test_missing_piece_is_inconsistent() {
        let enc = PiecewiseEncoder::default()
            .encode_bounded(VarKey::Item(0), 3)
            .unwrap();
        let raw = BTreeMap::from([(PieceId::new(VarKey::Item(0), 0), 1)]);
        assert!(matches!(
            enc.value_of(&raw),
            Err(QuboError::DecodeInconsistency { .. })
        ));
    }

    #[test]
    fn test_out_of_domain_piece_is_inconsistent() {
        let enc = PiecewiseEncoder::default()
            .encode_bounded(VarKey::Item(0), 1)
            .unwrap();
        let raw = BTreeMap::from([(PieceId::new(VarKey::Item(0), 0), 2)]);
        assert!(matches!(
            enc.value_of(&raw),
            Err(QuboError::DecodeInconsistency { .. })
        ));
    }

    #[test]
    fn test_assign_above_bound_rejected() {
        let enc = PiecewiseEncoder::default()
            .encode_bounded(VarKey::Item(0), 5)
            .unwrap();
        assert!(enc.assign(6).is_err());
    }

    proptest! {
        #[test]
        fn prop_binary_span_is_exact(bound in 0i64..=48) {
            let enc = PiecewiseEncoder::new(EncodingMode::Binary)
                .encode_bounded(VarKey::Aux(0), bound)
                .unwrap();
            let expected: BTreeSet<u64> = (0..=bound as u64).collect();
            prop_assert_eq!(reachable_sums(&enc), expected);
        }

        #[test]
        fn prop_discrete_span_is_exact(bound in 0i64..=48) {
            let enc = PiecewiseEncoder::new(EncodingMode::Discrete)
                .encode_bounded(VarKey::Aux(0), bound)
                .unwrap();
            let expected: BTreeSet<u64> = (0..=bound as u64).collect();
            prop_assert_eq!(reachable_sums(&enc), expected);
        }

        #[test]
        fn prop_round_trip(bound in 0i64..=300, pick in any::<u64>(), discrete in any::<bool>()) {
            let mode = if discrete { EncodingMode::Discrete } else { EncodingMode::Binary };
            let enc = PiecewiseEncoder::new(mode)
                .encode_bounded(VarKey::Aux(1), bound)
                .unwrap();
            let value = pick % (bound as u64 + 1);
            let raw: BTreeMap<PieceId, u64> = enc.assign(value).unwrap().into_iter().collect();
            prop_assert_eq!(enc.value_of(&raw).unwrap(), value);
        }
    }
}
