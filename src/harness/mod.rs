//! Experiment harness.
//!
//! Samples problem instances, runs the configured strategies on each, scores
//! every result with [`crate::total_cost`], and aggregates the outcome.
//!
//! Every random stream is derived from the master seed, the trial index and a
//! stream label, so a strategy's output depends only on those three values.
//! Trials share no state and may run on several worker threads without
//! changing any result.

pub mod config;
mod pool;
pub mod report;
pub mod strategy;

pub use config::{ExperimentBuilder, ExperimentConfig, MAX_DEMANDS};
pub use report::{
    ExperimentId, ExperimentReport, RelativePerformance, StrategyOutcome, StrategySummary, TrialReport,
    TrialTimings,
};
pub use strategy::{Strategy, StrategyName, DEFAULT_Q};

use std::time::Instant;

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::clustering::{cluster, LloydConfig};
use crate::cost::{total_cost, OpeningCost};
use crate::error::{FacLocResult, ValidationError};
use crate::generator::DemandGenerator;
use crate::geometry::Point;
use crate::online::{self, OnlineParams};

/// Smallest demand count a trial samples.
pub const MIN_DEMANDS: usize = 2;

/// Label of the random stream used for demand generation.
const DEMAND_STREAM: &str = "demands";

/// Derives an independent 64-bit seed for one random stream of one trial.
///
/// # Examples
///
/// ```
/// use facloc::harness::derive_seed;
///
/// assert_eq!(derive_seed(1, 0, "demands"), derive_seed(1, 0, "demands"));
/// assert_ne!(derive_seed(1, 0, "demands"), derive_seed(1, 1, "demands"));
/// ```
#[must_use]
pub fn derive_seed(master: u64, trial: usize, stream: &str) -> u64 {
    let mut hasher = blake3::Hasher::new_derive_key("facloc 2024 trial stream seed");
    hasher.update(&master.to_le_bytes());
    hasher.update(&(trial as u64).to_le_bytes());
    hasher.update(stream.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

fn stream_rng(master: u64, trial: usize, stream: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(master, trial, stream))
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_micros(started: Instant) -> u64 {
    started.elapsed().as_micros().min(u128::from(u64::MAX)) as u64
}

enum Algorithm {
    Online(OnlineParams),
    Lloyd(LloydConfig),
}

/// A validated, seeded experiment ready to run.
pub struct Experiment {
    config: ExperimentConfig,
    seed: u64,
    opening_cost: OpeningCost,
    algorithms: Vec<(StrategyName, Algorithm)>,
}

impl Experiment {
    /// Validates `config` and fixes the master seed.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found; nothing runs in that case.
    pub fn new(config: ExperimentConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let opening_cost = OpeningCost::new(config.opening_cost)?;
        let seed = config.seed.unwrap_or_else(rand::random);

        let mut algorithms = Vec::new();
        for name in config.strategy.names() {
            let algorithm = match (config.strategy.q_for(name), config.strategy.lloyd()) {
                (Some(q), _) => Algorithm::Online(OnlineParams::with_opening_cost(opening_cost, q)?),
                (None, Some(lloyd)) => Algorithm::Lloyd(lloyd),
                (None, None) => {
                    return Err(ValidationError::UnknownStrategy {
                        tag: name.to_string(),
                    })
                }
            };
            algorithms.push((name, algorithm));
        }

        Ok(Self {
            config,
            seed,
            opening_cost,
            algorithms,
        })
    }

    /// The master seed in use.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Number of demands trial `index` samples.
    ///
    /// A random fraction of the area's grid size, never fewer than [`MIN_DEMANDS`]
    /// nor more than [`MAX_DEMANDS`].
    #[must_use]
    pub fn demand_count(&self, index: usize) -> usize {
        let mut rng = stream_rng(self.seed, index, DEMAND_STREAM);
        self.sample_demand_count(&mut rng)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sample_demand_count<R: Rng>(&self, rng: &mut R) -> usize {
        let (min, max) = self.config.demand_fraction;
        let fraction = if min < max { rng.gen_range(min..=max) } else { min };
        ((self.config.area.grid_size() * fraction).floor() as usize).clamp(MIN_DEMANDS, MAX_DEMANDS)
    }

    /// Generates the demand stream of trial `index`.
    #[must_use]
    pub fn demands(&self, index: usize) -> Vec<Point> {
        let mut rng = stream_rng(self.seed, index, DEMAND_STREAM);
        let count = self.sample_demand_count(&mut rng);
        self.config.generator.generate(count, &self.config.area, &mut rng)
    }

    /// Runs trial `index`: generates its demands and evaluates them.
    ///
    /// # Errors
    ///
    /// Propagates the first strategy failure.
    pub fn run_trial(&self, index: usize) -> FacLocResult<TrialReport> {
        let started = Instant::now();
        let demands = self.demands(index);
        let generation_micros = elapsed_micros(started);

        let mut report = self.evaluate(index, &demands)?;
        if let Some(timings) = report.timings.as_mut() {
            timings.generation_micros = generation_micros;
        }
        debug!(
            trial = index,
            demands = report.demand_count,
            costs = ?report.outcomes.iter().map(|o| (o.strategy.as_str(), o.total_cost.as_f64())).collect::<Vec<_>>(),
            timings = ?report.timings,
            "trial finished"
        );
        Ok(report)
    }

    /// Runs every configured strategy on a caller-supplied stream, as trial `index`.
    ///
    /// Each strategy draws from its own stream derived from the master seed,
    /// the trial index and the strategy name.
    ///
    /// # Errors
    ///
    /// Returns `FacLocError::InvalidConfiguration` for non-finite positions.
    pub fn evaluate(&self, index: usize, demands: &[Point]) -> FacLocResult<TrialReport> {
        let mut outcomes = Vec::with_capacity(self.algorithms.len());
        let mut strategy_micros = Vec::with_capacity(self.algorithms.len());

        for (name, algorithm) in &self.algorithms {
            let mut rng = stream_rng(self.seed, index, name.as_str());
            let started = Instant::now();
            let (solution, rounds) = match algorithm {
                Algorithm::Online(params) => {
                    let out = online::run(demands, params, &mut rng)?;
                    debug_assert_eq!(out.total_cost, total_cost(&out.solution, self.opening_cost));
                    (out.solution, None)
                }
                Algorithm::Lloyd(lloyd) => {
                    let out = cluster(&self.config.area, demands, lloyd, &mut rng)?;
                    (out.solution, Some(out.rounds))
                }
            };
            strategy_micros.push((*name, elapsed_micros(started)));
            outcomes.push(StrategyOutcome {
                strategy: *name,
                total_cost: total_cost(&solution, self.opening_cost),
                solution,
                rounds,
            });
        }

        let comparisons = compare_to_baseline(&outcomes);
        Ok(TrialReport {
            index,
            demand_count: demands.len(),
            outcomes,
            comparisons,
            timings: self.config.record_timings.then(|| TrialTimings {
                generation_micros: 0,
                strategy_micros,
            }),
        })
    }

    /// Runs every trial and aggregates the results.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any trial fails; no partial report is produced.
    pub fn run(&self) -> FacLocResult<ExperimentReport> {
        let id = ExperimentId::derive(self.seed, &self.config);
        let started_at = Utc::now();
        info!(
            %id,
            seed = self.seed,
            trials = self.config.iterations,
            workers = self.config.workers,
            "experiment started"
        );

        let trials = pool::run_indexed(self.config.iterations, self.config.workers, |i| self.run_trial(i))?;

        let summaries = self
            .config
            .strategy
            .names()
            .into_iter()
            .filter_map(|name| StrategySummary::collect(name, &trials))
            .collect::<Vec<_>>();
        for s in &summaries {
            info!(
                %id,
                strategy = s.strategy.as_str(),
                mean_facilities = s.mean_facilities,
                mean_cost = s.mean_cost,
                "strategy summary"
            );
        }

        Ok(ExperimentReport {
            id,
            started_at,
            seed: self.seed,
            config: self.config.clone(),
            trials,
            summaries,
        })
    }
}

fn compare_to_baseline(outcomes: &[StrategyOutcome]) -> Vec<RelativePerformance> {
    let Some(baseline) = outcomes.iter().find(|o| o.strategy == StrategyName::Lloyd) else {
        return Vec::new();
    };
    outcomes
        .iter()
        .filter(|o| o.strategy.is_online())
        .filter_map(|o| RelativePerformance::between(o.strategy, o.total_cost, baseline.strategy, baseline.total_cost))
        .collect()
}

/// Validates `config`, runs all trials, and returns the aggregated report.
///
/// # Errors
///
/// Returns `FacLocError::InvalidConfiguration` before any trial runs if the
/// configuration is invalid, or the first trial failure otherwise.
///
/// # Examples
///
/// ```
/// use facloc::{run_trials, ExperimentConfig, StrategyName};
///
/// let config = ExperimentConfig::builder()
///     .iterations(3)
///     .opening_cost(20.0)
///     .seed(42)
///     .build()
///     .unwrap();
/// let report = run_trials(config).unwrap();
/// assert_eq!(report.trials.len(), 3);
/// assert!(report.trials[0].outcome(StrategyName::Lloyd).is_some());
/// ```
pub fn run_trials(config: ExperimentConfig) -> FacLocResult<ExperimentReport> {
    Experiment::new(config)?.run()
}
