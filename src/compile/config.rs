//! Compilation settings.

use crate::encode::EncodingMode;

/// Configuration for one model compilation.
///
/// Penalty weights are not part of this struct; each
/// [`PenaltyBlock`](crate::penalty::PenaltyBlock) carries its own, so
/// differently scaled problem instances can be compiled side by side.
///
/// # Examples
///
/// ```
/// use u_qubo::compile::CompileConfig;
/// use u_qubo::encode::EncodingMode;
///
/// let config = CompileConfig::default()
///     .with_encoding(EncodingMode::Discrete)
///     .with_objective_weight(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompileConfig {
    /// How bounded variables are split into pieces.
    pub encoding: EncodingMode,

    /// Objective weight `B`. Every objective term is multiplied by it.
    pub objective_weight: i64,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingMode::Binary,
            objective_weight: 1,
        }
    }
}

impl CompileConfig {
    pub fn with_encoding(mut self, encoding: EncodingMode) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_objective_weight(mut self, weight: i64) -> Self {
        self.objective_weight = weight;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.objective_weight <= 0 {
            return Err(format!(
                "objective_weight must be positive, got {}",
                self.objective_weight
            ));
        }
        Ok(())
    }

    /// Parses a configuration from TOML. Missing keys take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> crate::error::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
