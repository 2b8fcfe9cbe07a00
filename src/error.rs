//! Error types for facloc.
//!
//! All errors are strongly typed using thiserror. Configuration problems are
//! reported before any work starts, so a run either completes or fails without
//! producing a partial report.

use thiserror::Error;

/// Validation errors raised while checking configuration and inputs.
///
/// Surfaced at the top level as [`FacLocError::InvalidConfiguration`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Opening cost must be positive and finite, got {value}")]
    NonPositiveOpeningCost {
        value: f64,
    },

    #[error("Cost must be non-negative and finite, got {value}")]
    InvalidCost {
        value: f64,
    },

    #[error("Opening cost {value} is below the cost precision of {min}")]
    OpeningCostBelowPrecision {
        value: f64,
        min: f64,
    },

    #[error("Exploration factor q must lie in (0, 1], got {value}")]
    InvalidExplorationFactor {
        value: f64,
    },

    #[error("'{field}' must be greater than zero")]
    NonPositiveIterations {
        field: String,
    },

    #[error("Area must have positive, finite extent, got {width} x {height}")]
    InvalidArea {
        width: f64,
        height: f64,
    },

    #[error("Position ({x}, {y}) is not finite")]
    NonFinitePosition {
        x: f64,
        y: f64,
    },

    #[error("Position ({x}, {y}) lies outside the area {width} x {height}")]
    PositionOutsideArea {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    #[error("Unknown strategy '{tag}' (expected online, q-online, clustering or compare-all)")]
    UnknownStrategy {
        tag: String,
    },

    #[error("Demand fraction range ({min}, {max}) must satisfy 0 < min <= max <= 1")]
    InvalidDemandFraction {
        min: f64,
        max: f64,
    },

    #[error("Trials could ask for {requested} demands, more than the limit of {max}")]
    TooManyDemands {
        requested: f64,
        max: usize,
    },

    #[error("Center bias must lie in [0, 1), got {value}")]
    InvalidBias {
        value: f64,
    },
}

/// Errors raised while executing trials.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Failed to spawn trial worker: {message}")]
    WorkerSpawn {
        message: String,
    },

    #[error("Trial worker disconnected before reporting trial {trial}")]
    Disconnected {
        trial: usize,
    },

    #[error("Trial worker panicked")]
    WorkerPanicked,
}

/// Errors raised while encoding or decoding reports and configs.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to serialize {what}: {message}")]
    SerializationFailed {
        what: String,
        message: String,
    },

    #[error("Failed to deserialize {what}: {message}")]
    DeserializationFailed {
        what: String,
        message: String,
    },
}

/// Top-level error type for facloc.
#[derive(Debug, Error)]
pub enum FacLocError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl FacLocError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a report error.
    #[must_use]
    pub const fn is_report(&self) -> bool {
        matches!(self, Self::Report(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for facloc operations.
pub type FacLocResult<T> = Result<T, FacLocError>;
