//! Offline clustering baseline (Lloyd iteration).
//!
//! Needs the whole demand set up front and makes several passes over it. Used
//! only as a yardstick for the online rules.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::{DemandId, Solution};
use crate::error::ValidationError;
use crate::geometry::{distance, Area, Point};

/// Lloyd iteration limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LloydConfig {
    /// Maximum number of assign/recompute rounds.
    pub max_iterations: usize,
}

impl Default for LloydConfig {
    fn default() -> Self {
        Self { max_iterations: 50 }
    }
}

impl LloydConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonPositiveIterations` for a zero round limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_iterations == 0 {
            return Err(ValidationError::NonPositiveIterations {
                field: "max_iterations".to_string(),
            });
        }
        Ok(())
    }
}

/// Result of a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringOutcome {
    /// One facility per surviving center, serving its last membership.
    pub solution: Solution,
    /// Rounds actually executed.
    pub rounds: usize,
    /// Number of centers alive after each round.
    pub center_counts: Vec<usize>,
}

/// Initial number of centers for `demands` points: `floor(sqrt(demands))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn initial_center_count(demands: usize) -> usize {
    let mut k = (demands as f64).sqrt() as usize;
    // Guard against float error around perfect squares.
    while (k + 1) * (k + 1) <= demands {
        k += 1;
    }
    while k * k > demands {
        k -= 1;
    }
    k
}

/// Clusters `demands` starting from `floor(sqrt(n))` uniformly random centers
/// inside `area`.
///
/// # Errors
///
/// Returns a `ValidationError` for a zero iteration limit, a degenerate area,
/// or non-finite positions.
pub fn cluster<R: Rng + ?Sized>(
    area: &Area,
    demands: &[Point],
    config: &LloydConfig,
    rng: &mut R,
) -> Result<ClusteringOutcome, ValidationError> {
    area.validate()?;
    let k = initial_center_count(demands.len());
    let centers: Vec<Point> = (0..k).map(|_| area.random_point(rng)).collect();
    cluster_from_centers(demands, centers, config)
}

/// Clusters `demands` starting from the given centers.
///
/// Each round assigns every demand to its nearest center (earliest center wins
/// ties), drops centers that attracted nothing, and moves the rest to the mean
/// of their members. The center count never grows. Iteration stops after
/// `max_iterations` rounds or as soon as a round leaves every center in place.
///
/// # Errors
///
/// Returns a `ValidationError` for a zero iteration limit or non-finite positions.
pub fn cluster_from_centers(
    demands: &[Point],
    centers: Vec<Point>,
    config: &LloydConfig,
) -> Result<ClusteringOutcome, ValidationError> {
    config.validate()?;
    for p in demands.iter().chain(centers.iter()) {
        p.validate()?;
    }

    let mut solution = Solution::with_capacity(demands.len());
    let ids: Vec<DemandId> = demands.iter().map(|&p| solution.push_demand(p)).collect();

    if demands.is_empty() || centers.is_empty() {
        return Ok(ClusteringOutcome {
            solution,
            rounds: 0,
            center_counts: Vec::new(),
        });
    }

    let mut centers = centers;
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut center_counts = Vec::with_capacity(config.max_iterations);

    for round in 0..config.max_iterations {
        members = vec![Vec::new(); centers.len()];
        for (i, p) in demands.iter().enumerate() {
            members[nearest_center(p, &centers)].push(i);
        }

        let before = centers.len();
        let mut moved = false;
        let mut next_centers = Vec::with_capacity(before);
        let mut next_members = Vec::with_capacity(before);
        for (center, group) in centers.iter().zip(members.drain(..)) {
            let Some(mean) = Point::centroid(group.iter().map(|&i| &demands[i])) else {
                continue;
            };
            moved |= mean != *center;
            next_centers.push(mean);
            next_members.push(group);
        }
        centers = next_centers;
        members = next_members;
        center_counts.push(centers.len());

        trace!(round, centers = centers.len(), dropped = before - centers.len(), "lloyd round");

        if !moved && centers.len() == before {
            break;
        }
    }

    for (center, group) in centers.into_iter().zip(members) {
        let service = group.into_iter().map(|i| ids[i]).collect();
        solution.open_facility_serving(center, service);
    }

    Ok(ClusteringOutcome {
        rounds: center_counts.len(),
        solution,
        center_counts,
    })
}

fn nearest_center(p: &Point, centers: &[Point]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = distance(p, c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}
