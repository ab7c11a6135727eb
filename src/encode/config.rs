//! Encoding mode selection.

/// How a bounded integer variable is split into pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EncodingMode {
    /// Power-of-two binary pieces with a remainder tier on top.
    ///
    /// Bound `B` uses `floor(log2(B)) + 1` pieces. Every solver accepts
    /// this form.
    #[default]
    Binary,

    /// One multi-valued piece with native domain `{0..=B}`.
    ///
    /// Only for solvers that handle discrete variables directly.
    Discrete,
}
