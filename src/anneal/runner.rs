//! Sweep-based annealing loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use super::config::AnnealConfig;
use crate::error::{QuboError, Result};
use crate::model::QuadraticModel;
use crate::solve::indexed::IndexedModel;
use crate::solve::{QuboSolver, Sample, SolveParams};

/// Outcome of one read.
#[derive(Debug, Clone)]
struct ReadResult {
    best: Vec<u64>,
    best_energy: i64,
    accepted_moves: usize,
    improving_moves: usize,
}

/// Simulated annealing over pieces.
///
/// Each read starts from a uniformly random state and performs
/// `num_sweeps` sweeps; a sweep proposes one new value for every piece in
/// order (a flip for binary pieces, a different value for multi-valued
/// ones) and accepts it by the Metropolis criterion. Energies are tracked
/// exactly with incremental deltas. The lowest energy over all reads wins,
/// ties going to the earlier read.
///
/// If the time limit passes before every read finishes, the whole call
/// fails with `SolverTimeout`.
///
/// # References
///
/// - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
/// - Isakov et al. (2015), "Optimised simulated annealing for Ising spin glasses"
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealer {
    config: AnnealConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl SimulatedAnnealer {
    pub fn new(config: AnnealConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Stops all reads once `flag` is set; the call then returns
    /// `SolverInfeasible`.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &AnnealConfig {
        &self.config
    }

    /// Temperature range for `indexed`, honoring explicit settings.
    fn temperature_range(&self, indexed: &IndexedModel) -> (f64, f64) {
        let hot = self.config.initial_temperature.unwrap_or_else(|| {
            let max_delta = indexed.max_abs_delta().max(1) as f64;
            max_delta / std::f64::consts::LN_2
        });
        let cold = self.config.min_temperature.unwrap_or_else(|| {
            let min_coefficient = indexed.min_abs_coefficient().max(1) as f64;
            min_coefficient / 100f64.ln()
        });
        if cold < hot {
            (hot, cold)
        } else {
            (hot, hot / 100.0)
        }
    }

    fn run_reads(
        &self,
        indexed: &IndexedModel,
        temperatures: &[f64],
        params: &SolveParams,
        deadline: Option<(Instant, Duration)>,
    ) -> Vec<Result<ReadResult>> {
        let base_seed = params.seed.unwrap_or_else(rand::random);
        let cancel = self.cancel.as_deref();
        let run = |read: usize| {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(read as u64));
            anneal_read(indexed, temperatures, &mut rng, deadline, cancel)
        };

        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return (0..params.num_reads).into_par_iter().map(run).collect();
        }
        (0..params.num_reads).map(run).collect()
    }
}

impl QuboSolver for SimulatedAnnealer {
    fn name(&self) -> &str {
        "simulated-annealing"
    }

    fn sample(&self, model: &QuadraticModel, params: &SolveParams) -> Result<Sample> {
        self.config.validate().map_err(QuboError::InvalidConfig)?;
        params.validate().map_err(QuboError::InvalidConfig)?;

        let indexed = IndexedModel::new(model)?;
        let (hot, cold) = self.temperature_range(&indexed);
        let temperatures = self
            .config
            .cooling
            .temperatures(hot, cold, params.num_sweeps);
        let deadline = params.time_budget().map(|limit| (Instant::now(), limit));

        let mut best: Option<ReadResult> = None;
        let mut accepted = 0usize;
        let mut improving = 0usize;
        for read in self.run_reads(&indexed, &temperatures, params, deadline) {
            let read = read?;
            accepted += read.accepted_moves;
            improving += read.improving_moves;
            if best
                .as_ref()
                .map_or(true, |b| read.best_energy < b.best_energy)
            {
                best = Some(read);
            }
        }
        let best = best.ok_or_else(|| QuboError::SolverInfeasible("no reads completed".into()))?;

        debug!(
            reads = params.num_reads,
            sweeps = params.num_sweeps,
            initial_temperature = hot,
            min_temperature = cold,
            accepted,
            improving,
            best_energy = best.best_energy,
            "annealing finished"
        );
        Ok(Sample {
            assignment: indexed.to_assignment(&best.best),
            energy: best.best_energy as f64,
        })
    }
}

fn anneal_read<R: Rng>(
    indexed: &IndexedModel,
    temperatures: &[f64],
    rng: &mut R,
    deadline: Option<(Instant, Duration)>,
    cancel: Option<&AtomicBool>,
) -> Result<ReadResult> {
    let mut state: Vec<u64> = indexed
        .domains
        .iter()
        .map(|&max| rng.random_range(0..=max))
        .collect();
    let mut energy = indexed.energy(&state);
    let mut best = state.clone();
    let mut best_energy = energy;
    let mut accepted_moves = 0usize;
    let mut improving_moves = 0usize;

    for &temperature in temperatures {
        if let Some((start, limit)) = deadline {
            if start.elapsed() > limit {
                return Err(QuboError::SolverTimeout(limit));
            }
        }
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(QuboError::SolverInfeasible("annealing cancelled".into()));
        }

        for i in 0..indexed.len() {
            let max = indexed.domains[i];
            if max == 0 {
                continue;
            }
            let old = state[i];
            let proposal = if max == 1 {
                1 - old
            } else {
                let v = rng.random_range(0..max);
                if v >= old {
                    v + 1
                } else {
                    v
                }
            };

            let delta = indexed.delta(&state, i, proposal);

            // Metropolis acceptance criterion
            let accept = if delta < 0 {
                improving_moves += 1;
                true
            } else {
                let probability = (-(delta as f64) / temperature).exp();
                rng.random_range(0.0..1.0) < probability
            };

            if accept {
                state[i] = proposal;
                energy += delta;
                accepted_moves += 1;
                if energy < best_energy {
                    best_energy = energy;
                    best.clone_from(&state);
                }
            }
        }
    }

    Ok(ReadResult {
        best,
        best_energy,
        accepted_moves,
        improving_moves,
    })
}
