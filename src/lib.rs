//! # facloc - Online Facility Location
//!
//! Demands arrive one at a time at points in the plane. Each one is either
//! served by an already open facility, paying its distance, or becomes the
//! site of a new facility, paying a fixed opening cost. Decisions are final.
//!
//! ## Core Concepts
//!
//! - **Meyerson's rule**: open with probability `min(d / c, 1)`, where `d` is the
//!   distance to the nearest open facility and `c` the opening cost
//! - **q-Meyerson**: the same rule damped by an exploration factor `q` in `(0, 1]`
//! - **Lloyd baseline**: offline clustering that sees the whole stream at once
//! - **Harness**: seeded trials comparing the rules against the baseline
//!
//! ## Usage
//!
//! ```rust
//! use facloc::{online, OnlineParams, Point};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let stream = [Point::new(0.0, 0.0), Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
//! let params = OnlineParams::classical(10.0)?;
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//!
//! let outcome = online::run(&stream, &params, &mut rng)?;
//! assert!(outcome.solution.facility_count() >= 1);
//! # Ok::<(), facloc::ValidationError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Model
pub mod cost;
pub mod entity;
pub mod error;
pub mod geometry;

// Algorithms
pub mod clustering;
pub mod generator;
pub mod online;

// Experiments
pub mod harness;

pub use clustering::{cluster, cluster_from_centers, initial_center_count, ClusteringOutcome, LloydConfig};
pub use cost::{total_cost, Cost, OpeningCost};
pub use entity::{Demand, DemandId, Facility, FacilityId, Solution};
pub use error::{ExecutionError, FacLocError, FacLocResult, ReportError, ValidationError};
pub use generator::{CenterBiasedGenerator, DemandGenerator, GeneratorKind, UniformGenerator};
pub use geometry::{distance, round_to, Area, Point};
pub use online::{
    consider, nearest_facility, opening_probability, Action, Decision, MeyersonSession, OnlineOutcome,
    OnlineParams, StepOutcome,
};

pub use harness::{
    run_trials, Experiment, ExperimentBuilder, ExperimentConfig, ExperimentId, ExperimentReport,
    RelativePerformance, Strategy, StrategyName, StrategyOutcome, StrategySummary, TrialReport,
    TrialTimings,
};
