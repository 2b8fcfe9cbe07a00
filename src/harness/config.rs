//! Experiment configuration.

use serde::{Deserialize, Serialize};

use crate::cost::OpeningCost;
use crate::error::{FacLocResult, ReportError, ValidationError};
use crate::generator::GeneratorKind;
use crate::geometry::Area;

use super::strategy::Strategy;

/// Largest demand count a single trial may sample.
pub const MAX_DEMANDS: usize = 1_000_000;

/// Everything a batch of trials needs.
///
/// Missing fields fall back to [`ExperimentConfig::default`] when decoded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of trials.
    pub iterations: usize,
    /// Region demands are drawn from.
    pub area: Area,
    /// Charge per opened facility.
    pub opening_cost: f64,
    /// Algorithms to run per trial.
    pub strategy: Strategy,
    /// Master seed. Drawn from OS entropy when absent and recorded in the report.
    pub seed: Option<u64>,
    /// Demand stream generator.
    pub generator: GeneratorKind,
    /// Range the per-trial fraction of the area's grid size is drawn from.
    pub demand_fraction: (f64, f64),
    /// Worker threads for trial execution.
    pub workers: usize,
    /// Record wall-clock duration of each trial phase.
    pub record_timings: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            area: Area::default(),
            opening_cost: 40.0,
            strategy: Strategy::default(),
            seed: None,
            generator: GeneratorKind::default(),
            demand_fraction: (0.01, 0.1),
            workers: 1,
            record_timings: false,
        }
    }
}

impl ExperimentConfig {
    /// Validate the configuration.
    ///
    /// Must pass before any trial runs.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field, including an area and fraction range
    /// that could ask for more than [`MAX_DEMANDS`] demands in one trial.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.iterations == 0 {
            return Err(ValidationError::NonPositiveIterations {
                field: "iterations".to_string(),
            });
        }
        self.area.validate()?;
        OpeningCost::new(self.opening_cost)?;
        self.strategy.validate()?;
        self.generator.validate()?;

        let (min, max) = self.demand_fraction;
        if !(min > 0.0 && min <= max && max <= 1.0) {
            return Err(ValidationError::InvalidDemandFraction { min, max });
        }

        let largest = (self.area.grid_size() * max).floor();
        #[allow(clippy::cast_precision_loss)]
        let limit = MAX_DEMANDS as f64;
        if largest > limit {
            return Err(ValidationError::TooManyDemands {
                requested: largest,
                max: MAX_DEMANDS,
            });
        }
        Ok(())
    }

    /// Decodes and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns a report error for malformed JSON and a configuration error for
    /// invalid values.
    pub fn from_json(json: &str) -> FacLocResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| ReportError::DeserializationFailed {
            what: "experiment config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> ExperimentBuilder {
        ExperimentBuilder::default()
    }
}

/// Fluent builder for [`ExperimentConfig`].
#[derive(Debug, Clone, Default)]
pub struct ExperimentBuilder {
    config: ExperimentConfig,
}

impl ExperimentBuilder {
    /// Set the number of trials.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the area.
    #[must_use]
    pub fn area(mut self, area: Area) -> Self {
        self.config.area = area;
        self
    }

    /// Set the opening cost.
    #[must_use]
    pub fn opening_cost(mut self, opening_cost: f64) -> Self {
        self.config.opening_cost = opening_cost;
        self
    }

    /// Set the strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Fix the master seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the demand generator.
    #[must_use]
    pub fn generator(mut self, generator: GeneratorKind) -> Self {
        self.config.generator = generator;
        self
    }

    /// Set the demand fraction range.
    #[must_use]
    pub fn demand_fraction(mut self, min: f64, max: f64) -> Self {
        self.config.demand_fraction = (min, max);
        self
    }

    /// Set the worker count. Zero is treated as one.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Toggle phase timings.
    #[must_use]
    pub fn record_timings(mut self, record: bool) -> Self {
        self.config.record_timings = record;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` reported by [`ExperimentConfig::validate`].
    pub fn build(self) -> Result<ExperimentConfig, ValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
