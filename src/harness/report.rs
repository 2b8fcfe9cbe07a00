//! Trial and experiment reports.
//!
//! Reports are plain in-process data. Formatting and rendering are left to
//! consumers; JSON helpers exist for handing reports across process boundaries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cost::Cost;
use crate::entity::Solution;
use crate::error::{FacLocResult, ReportError};

use super::config::ExperimentConfig;
use super::strategy::StrategyName;

/// Stable identifier for an experiment, derived from its seed and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(Uuid);

impl ExperimentId {
    /// Derives the id for `seed` and `config`.
    #[must_use]
    pub fn derive(seed: u64, config: &ExperimentConfig) -> Self {
        let name = format!("facloc:{seed}:{config:?}");
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One algorithm's result on one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    /// Which algorithm.
    pub strategy: StrategyName,
    /// Demands and facilities.
    pub solution: Solution,
    /// Cost as scored by [`crate::total_cost`].
    pub total_cost: Cost,
    /// Lloyd rounds executed, for the baseline.
    pub rounds: Option<usize>,
}

impl StrategyOutcome {
    /// Number of facilities opened.
    #[must_use]
    pub fn facility_count(&self) -> usize {
        self.solution.facility_count()
    }
}

/// Relative cost of a strategy against a baseline: `cost / baseline - 1`.
///
/// Displays as a signed percentage with two fractional digits.
///
/// # Examples
///
/// ```
/// use facloc::{Cost, RelativePerformance, StrategyName};
///
/// let rel = RelativePerformance::between(
///     StrategyName::Meyerson,
///     Cost::from_f64(125.0).unwrap(),
///     StrategyName::Lloyd,
///     Cost::from_f64(100.0).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(rel.to_string(), "+25.00%");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativePerformance {
    /// Strategy being compared.
    pub strategy: StrategyName,
    /// Strategy compared against.
    pub baseline: StrategyName,
    /// `cost / baseline_cost - 1`.
    pub ratio: f64,
}

impl RelativePerformance {
    /// Compares `cost` against `baseline_cost`, or `None` when the baseline is free.
    #[must_use]
    pub fn between(strategy: StrategyName, cost: Cost, baseline: StrategyName, baseline_cost: Cost) -> Option<Self> {
        if baseline_cost == Cost::ZERO {
            return None;
        }
        Some(Self {
            strategy,
            baseline,
            ratio: cost.as_f64() / baseline_cost.as_f64() - 1.0,
        })
    }

    /// The ratio as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.ratio * 100.0
    }
}

impl fmt::Display for RelativePerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.2}%", self.percent())
    }
}

/// Wall-clock duration of each trial phase, in microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialTimings {
    /// Demand generation.
    pub generation_micros: u64,
    /// Each algorithm, in run order.
    pub strategy_micros: Vec<(StrategyName, u64)>,
}

/// Everything recorded for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    /// Trial index within the experiment.
    pub index: usize,
    /// Number of demands generated.
    pub demand_count: usize,
    /// Per-algorithm results, in run order.
    pub outcomes: Vec<StrategyOutcome>,
    /// Online rules against the baseline, when both ran.
    pub comparisons: Vec<RelativePerformance>,
    /// Phase durations, when requested.
    pub timings: Option<TrialTimings>,
}

impl TrialReport {
    /// Looks up one algorithm's result.
    #[must_use]
    pub fn outcome(&self, strategy: StrategyName) -> Option<&StrategyOutcome> {
        self.outcomes.iter().find(|o| o.strategy == strategy)
    }

    /// Looks up a comparison.
    #[must_use]
    pub fn comparison(&self, strategy: StrategyName) -> Option<&RelativePerformance> {
        self.comparisons.iter().find(|c| c.strategy == strategy)
    }
}

/// Aggregate of one algorithm across all trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    /// Which algorithm.
    pub strategy: StrategyName,
    /// Trials it ran in.
    pub trials: usize,
    /// Mean facility count.
    pub mean_facilities: f64,
    /// Mean total cost.
    pub mean_cost: f64,
    /// Cheapest trial.
    pub min_cost: Cost,
    /// Most expensive trial.
    pub max_cost: Cost,
    /// Mean ratio against the baseline, when compared.
    pub mean_relative: Option<f64>,
}

impl StrategySummary {
    /// Aggregates `strategy` over `trials`; `None` if it never ran.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn collect(strategy: StrategyName, trials: &[TrialReport]) -> Option<Self> {
        let outcomes: Vec<&StrategyOutcome> = trials.iter().filter_map(|t| t.outcome(strategy)).collect();
        if outcomes.is_empty() {
            return None;
        }
        let n = outcomes.len() as f64;
        let mean_facilities = outcomes.iter().map(|o| o.facility_count() as f64).sum::<f64>() / n;
        let mean_cost = outcomes.iter().map(|o| o.total_cost.as_f64()).sum::<f64>() / n;
        let min_cost = outcomes.iter().map(|o| o.total_cost).min().unwrap_or_default();
        let max_cost = outcomes.iter().map(|o| o.total_cost).max().unwrap_or_default();

        let ratios: Vec<f64> = trials
            .iter()
            .filter_map(|t| t.comparison(strategy))
            .map(|c| c.ratio)
            .collect();
        let mean_relative = (!ratios.is_empty()).then(|| ratios.iter().sum::<f64>() / ratios.len() as f64);

        Some(Self {
            strategy,
            trials: outcomes.len(),
            mean_facilities,
            mean_cost,
            min_cost,
            max_cost,
            mean_relative,
        })
    }
}

/// Result of a batch of trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Experiment id.
    pub id: ExperimentId,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Master seed actually used.
    pub seed: u64,
    /// Configuration the run used.
    pub config: ExperimentConfig,
    /// Per-trial reports, in trial order.
    pub trials: Vec<TrialReport>,
    /// Per-algorithm aggregates.
    pub summaries: Vec<StrategySummary>,
}

impl ExperimentReport {
    /// Looks up an algorithm's aggregate.
    #[must_use]
    pub fn summary(&self, strategy: StrategyName) -> Option<&StrategySummary> {
        self.summaries.iter().find(|s| s.strategy == strategy)
    }

    /// Encodes the report as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::SerializationFailed` if encoding fails.
    pub fn to_json(&self) -> FacLocResult<String> {
        serde_json::to_string(self).map_err(|e| {
            ReportError::SerializationFailed {
                what: "experiment report".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Decodes a report from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::DeserializationFailed` for malformed or mistyped input.
    pub fn from_json(json: &str) -> FacLocResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ReportError::DeserializationFailed {
                what: "experiment report".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}
