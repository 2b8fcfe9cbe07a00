//! Strategy selection.
//!
//! Strategies are a closed set resolved once at the configuration boundary;
//! the engines never see a string selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clustering::LloydConfig;
use crate::error::ValidationError;
use crate::online::{validate_q, CLASSICAL_Q};

/// Exploration factor used when a selector tag carries none.
pub const DEFAULT_Q: f64 = 0.5;

/// Name of a single algorithm as it appears in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    /// Classical online rule (`q = 1`).
    Meyerson,
    /// Damped online rule.
    QMeyerson,
    /// Offline clustering baseline.
    Lloyd,
}

impl StrategyName {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Meyerson => "meyerson",
            Self::QMeyerson => "q-meyerson",
            Self::Lloyd => "lloyd",
        }
    }

    /// Returns true for the online rules.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Meyerson | Self::QMeyerson)
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which algorithms a trial runs, with their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Strategy {
    /// Classical online rule only.
    Online,
    /// Damped online rule only.
    QOnline {
        /// Exploration factor in `(0, 1]`.
        q: f64,
    },
    /// Clustering baseline only.
    Clustering {
        /// Lloyd round limit.
        max_iterations: usize,
    },
    /// Both online rules and the baseline, with relative performance.
    CompareAll {
        /// Exploration factor of the damped rule.
        q: f64,
        /// Lloyd round limit.
        max_iterations: usize,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::CompareAll {
            q: DEFAULT_Q,
            max_iterations: LloydConfig::default().max_iterations,
        }
    }
}

impl Strategy {
    /// Resolves a selector tag into a strategy carrying `q` and `max_iterations`
    /// where they apply.
    ///
    /// Accepted tags: `online`/`meyerson`, `q-online`/`q-meyerson`,
    /// `clustering`/`lloyd`, `compare-all`/`compare`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownStrategy` for any other tag, or the
    /// parameter error of the resolved strategy.
    ///
    /// # Examples
    ///
    /// ```
    /// use facloc::Strategy;
    ///
    /// let s = Strategy::from_tag("q-online", 0.4, 30).unwrap();
    /// assert_eq!(s, Strategy::QOnline { q: 0.4 });
    /// assert!(Strategy::from_tag("greedy", 0.4, 30).is_err());
    /// ```
    pub fn from_tag(tag: &str, q: f64, max_iterations: usize) -> Result<Self, ValidationError> {
        let strategy = match tag.trim().to_ascii_lowercase().as_str() {
            "online" | "meyerson" => Self::Online,
            "q-online" | "q-meyerson" => Self::QOnline { q },
            "clustering" | "lloyd" => Self::Clustering { max_iterations },
            "compare-all" | "compare" => Self::CompareAll { q, max_iterations },
            _ => {
                return Err(ValidationError::UnknownStrategy {
                    tag: tag.to_string(),
                })
            }
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Validate the strategy's parameters.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter: `q` outside `(0, 1]` or a zero round limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Self::Online => Ok(()),
            Self::QOnline { q } => validate_q(q),
            Self::Clustering { max_iterations } => LloydConfig { max_iterations }.validate(),
            Self::CompareAll { q, max_iterations } => {
                validate_q(q)?;
                LloydConfig { max_iterations }.validate()
            }
        }
    }

    /// Algorithms run per trial, in report order.
    #[must_use]
    pub fn names(&self) -> Vec<StrategyName> {
        match self {
            Self::Online => vec![StrategyName::Meyerson],
            Self::QOnline { .. } => vec![StrategyName::QMeyerson],
            Self::Clustering { .. } => vec![StrategyName::Lloyd],
            Self::CompareAll { .. } => vec![
                StrategyName::Meyerson,
                StrategyName::QMeyerson,
                StrategyName::Lloyd,
            ],
        }
    }

    /// Exploration factor used by the online rule named `name`.
    #[must_use]
    pub fn q_for(&self, name: StrategyName) -> Option<f64> {
        match (name, self) {
            (StrategyName::Meyerson, _) => Some(CLASSICAL_Q),
            (StrategyName::QMeyerson, Self::QOnline { q } | Self::CompareAll { q, .. }) => Some(*q),
            _ => None,
        }
    }

    /// Lloyd configuration, if the strategy runs the baseline.
    #[must_use]
    pub const fn lloyd(&self) -> Option<LloydConfig> {
        match *self {
            Self::Clustering { max_iterations } | Self::CompareAll { max_iterations, .. } => {
                Some(LloydConfig { max_iterations })
            }
            Self::Online | Self::QOnline { .. } => None,
        }
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    /// Parses a tag with default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s, DEFAULT_Q, LloydConfig::default().max_iterations)
    }
}
