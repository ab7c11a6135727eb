//! Solver interface.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::Result;
use crate::model::QuadraticModel;
use crate::registry::PieceId;

/// Lowest-energy assignment a solver found.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Value of every piece.
    pub assignment: BTreeMap<PieceId, u64>,
    /// Energy as reported by the solver.
    pub energy: f64,
}

/// Options recognized by every solver.
///
/// Solvers ignore the ones that do not apply to them (an exhaustive
/// search has no sweeps).
///
/// # Examples
///
/// ```
/// use u_qubo::solve::SolveParams;
///
/// let params = SolveParams::default()
///     .with_num_reads(20)
///     .with_num_sweeps(500)
///     .with_time_limit(2.5)
///     .with_seed(42);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolveParams {
    /// Independent samples for stochastic solvers.
    pub num_reads: usize,

    /// Sweeps (one proposal per piece) per sample.
    pub num_sweeps: usize,

    /// Wall-clock budget in seconds. `None` = unlimited.
    pub time_limit: Option<f64>,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            num_reads: 10,
            num_sweeps: 1000,
            time_limit: None,
            seed: None,
        }
    }
}

impl SolveParams {
    pub fn with_num_reads(mut self, n: usize) -> Self {
        self.num_reads = n;
        self
    }

    pub fn with_num_sweeps(mut self, n: usize) -> Self {
        self.num_sweeps = n;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Time limit as a duration, if one is set and representable.
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_limit
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    /// Validates the parameters.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.num_reads == 0 {
            return Err("num_reads must be at least 1".into());
        }
        if self.num_sweeps == 0 {
            return Err("num_sweeps must be at least 1".into());
        }
        if let Some(limit) = self.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(format!("time_limit must be positive and finite, got {limit}"));
            }
        }
        Ok(())
    }

    /// Parses parameters from TOML. Missing keys take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// A component that searches for a low-energy assignment of a model.
///
/// Implementations may enumerate, anneal, or forward the model to a remote
/// service. Either way the call blocks until it has a best-effort answer
/// or fails; a solver that runs out of time returns `SolverTimeout` and no
/// partial sample.
pub trait QuboSolver {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Returns the lowest-energy assignment found.
    fn sample(&self, model: &QuadraticModel, params: &SolveParams) -> Result<Sample>;
}
