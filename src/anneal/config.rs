//! Annealer configuration and cooling schedules.

/// Temperature schedule across the sweeps of one read.
///
/// Every schedule starts at the initial temperature on the first sweep and
/// reaches the minimum temperature on the last one.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CoolingSchedule {
    /// `T_k = T_0 · (T_min / T_0)^(k / (n − 1))`.
    #[default]
    Geometric,

    /// `T_k = T_0 − k · (T_0 − T_min) / (n − 1)`.
    Linear,

    /// `T_{k+1} = T_k / (1 + β·T_k)` with
    /// `β = (T_0 − T_min) / ((n − 1) · T_0 · T_min)`.
    ///
    /// Cools fast at high temperature and slowly near the end.
    LundyMees,
}

impl CoolingSchedule {
    /// Temperature of every sweep.
    pub fn temperatures(&self, initial: f64, min: f64, sweeps: usize) -> Vec<f64> {
        if sweeps <= 1 {
            return vec![min; sweeps];
        }
        let steps = (sweeps - 1) as f64;
        match self {
            CoolingSchedule::Geometric => {
                let ratio = (min / initial).powf(1.0 / steps);
                let mut t = initial;
                (0..sweeps)
                    .map(|_| {
                        let current = t;
                        t *= ratio;
                        current
                    })
                    .collect()
            }
            CoolingSchedule::Linear => (0..sweeps)
                .map(|k| initial - k as f64 * (initial - min) / steps)
                .collect(),
            CoolingSchedule::LundyMees => {
                let beta = (initial - min) / (steps * initial * min);
                let mut t = initial;
                (0..sweeps)
                    .map(|_| {
                        let current = t;
                        t /= 1.0 + beta * t;
                        current
                    })
                    .collect()
            }
        }
    }
}

/// Configuration for [`SimulatedAnnealer`](super::SimulatedAnnealer).
///
/// Read count, sweep count, time limit and seed come from
/// [`SolveParams`](crate::solve::SolveParams); this struct holds what is
/// specific to annealing.
///
/// # Examples
///
/// ```
/// use u_qubo::anneal::{AnnealConfig, CoolingSchedule};
///
/// let config = AnnealConfig::default()
///     .with_initial_temperature(50.0)
///     .with_min_temperature(0.05)
///     .with_cooling(CoolingSchedule::Linear);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnnealConfig {
    /// Starting temperature. `None` derives it from the model so the
    /// largest single-move increase is accepted about half the time.
    pub initial_temperature: Option<f64>,

    /// Final temperature. `None` derives it from the model so the smallest
    /// coefficient is accepted about 1% of the time.
    pub min_temperature: Option<f64>,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Run reads on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temperature: None,
            min_temperature: None,
            cooling: CoolingSchedule::default(),
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl AnnealConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = Some(t);
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = Some(t);
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(t) = self.initial_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err("initial_temperature must be positive".into());
            }
        }
        if let Some(t) = self.min_temperature {
            if !t.is_finite() || t <= 0.0 {
                return Err("min_temperature must be positive".into());
            }
        }
        if let (Some(t0), Some(t_min)) = (self.initial_temperature, self.min_temperature) {
            if t_min >= t0 {
                return Err("min_temperature must be less than initial_temperature".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnnealConfig::default();
        assert!(config.initial_temperature.is_none());
        assert_eq!(config.cooling, CoolingSchedule::Geometric);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_temperature() {
        let config = AnnealConfig::default().with_initial_temperature(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_min_ge_initial() {
        let config = AnnealConfig::default()
            .with_initial_temperature(10.0)
            .with_min_temperature(20.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schedules_hit_endpoints() {
        for schedule in [
            CoolingSchedule::Geometric,
            CoolingSchedule::Linear,
            CoolingSchedule::LundyMees,
        ] {
            let temps = schedule.temperatures(100.0, 0.01, 50);
            assert_eq!(temps.len(), 50);
            assert!((temps[0] - 100.0).abs() < 1e-9, "{schedule:?}");
            assert!(
                (temps[49] - 0.01).abs() < 1e-6,
                "{schedule:?} ended at {}",
                temps[49]
            );
            for w in temps.windows(2) {
                assert!(w[1] < w[0], "{schedule:?} must cool monotonically");
            }
        }
    }

    #[test]
    fn test_single_sweep_runs_cold() {
        assert_eq!(
            CoolingSchedule::Geometric.temperatures(10.0, 0.5, 1),
            vec![0.5]
        );
    }
}
