//! Online decision engine (Meyerson and q-Meyerson).
//!
//! Demands are processed once, in arrival order. Each demand either opens a
//! new facility at its own position or is attached to the nearest open
//! facility; the choice is never revisited.
//!
//! The per-demand rule lives in [`consider`]. Both the batch entry point
//! [`run`] and the incremental [`MeyersonSession`] are thin loops over the
//! same step, so their facility sets and running costs agree exactly.

pub mod session;

pub use session::MeyersonSession;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cost::{Cost, OpeningCost};
use crate::entity::{DemandId, Facility, FacilityId, Solution};
use crate::error::ValidationError;
use crate::geometry::{distance, round_to, Point, PROBABILITY_PRECISION};

/// Exploration factor of the classical (un-damped) rule.
pub const CLASSICAL_Q: f64 = 1.0;

/// Parameters of the online rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OnlineParams {
    opening_cost: OpeningCost,
    q: f64,
}

impl OnlineParams {
    /// Creates validated parameters.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the opening cost is not positive or `q`
    /// lies outside `(0, 1]`.
    pub fn new(opening_cost: f64, q: f64) -> Result<Self, ValidationError> {
        Self::with_opening_cost(OpeningCost::new(opening_cost)?, q)
    }

    /// Parameters for the classical rule (`q = 1`).
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the opening cost is not positive.
    pub fn classical(opening_cost: f64) -> Result<Self, ValidationError> {
        Self::new(opening_cost, CLASSICAL_Q)
    }

    /// Creates parameters from an already validated opening cost.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidExplorationFactor` unless `q` lies in `(0, 1]`.
    pub fn with_opening_cost(opening_cost: OpeningCost, q: f64) -> Result<Self, ValidationError> {
        validate_q(q)?;
        Ok(Self { opening_cost, q })
    }

    /// The opening cost.
    #[must_use]
    pub const fn opening_cost(&self) -> OpeningCost {
        self.opening_cost
    }

    /// The exploration factor.
    #[must_use]
    pub const fn q(&self) -> f64 {
        self.q
    }

    /// Returns true for the classical rule.
    #[must_use]
    pub fn is_classical(&self) -> bool {
        self.q == CLASSICAL_Q
    }
}

pub(crate) fn validate_q(q: f64) -> Result<(), ValidationError> {
    if !(q > 0.0 && q <= 1.0) {
        return Err(ValidationError::InvalidExplorationFactor { value: q });
    }
    Ok(())
}

/// Probability of opening a new facility for a demand whose nearest open
/// facility is `nearest` away.
///
/// `None` means no facility is open yet and yields probability 1. Otherwise the
/// distance is normalized by the opening cost, rounded to
/// [`PROBABILITY_PRECISION`] decimals, damped by `q`, and capped at 1.
///
/// # Examples
///
/// ```
/// use facloc::{opening_probability, OpeningCost};
///
/// let cost = OpeningCost::new(10.0).unwrap();
/// assert_eq!(opening_probability(None, cost, 0.5), 1.0);
/// assert_eq!(opening_probability(Some(0.0), cost, 1.0), 0.0);
/// assert_eq!(opening_probability(Some(5.0), cost, 0.5), 0.25);
/// assert_eq!(opening_probability(Some(50.0), cost, 1.0), 1.0);
/// ```
#[must_use]
pub fn opening_probability(nearest: Option<f64>, opening_cost: OpeningCost, q: f64) -> f64 {
    match nearest {
        None => 1.0,
        Some(d) => {
            let normalized = round_to(d / opening_cost.as_f64(), PROBABILITY_PRECISION);
            (q * normalized).min(1.0)
        }
    }
}

/// Nearest facility to `position` by linear scan, with its rounded distance.
///
/// Ties go to the facility created first.
#[must_use]
pub fn nearest_facility(position: &Point, facilities: &[Facility]) -> Option<(FacilityId, f64)> {
    let mut best: Option<(FacilityId, f64)> = None;
    for f in facilities {
        let d = distance(position, &f.position);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((f.id, d)),
        }
    }
    best
}

/// What to do with an arriving demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Open a new facility at the demand's position.
    Open,
    /// Attach the demand to an existing facility.
    Assign {
        /// The nearest open facility.
        facility: FacilityId,
        /// Rounded distance to it.
        distance: f64,
    },
}

/// The outcome of [`consider`]: the chosen action and the probability it was drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Probability of opening that was in effect.
    pub probability: f64,
    /// The chosen action.
    pub action: Action,
}

/// Decides the fate of a demand at `position` given the currently open facilities.
///
/// Exactly one uniform value is drawn from `rng` per call, including for the
/// very first demand where the outcome is certain, so the random stream stays
/// aligned with the arrival sequence.
pub fn consider<R: Rng + ?Sized>(
    position: &Point,
    facilities: &[Facility],
    params: &OnlineParams,
    rng: &mut R,
) -> Decision {
    let nearest = nearest_facility(position, facilities);
    let probability = opening_probability(nearest.map(|(_, d)| d), params.opening_cost, params.q);
    let draw: f64 = rng.gen();
    let action = match nearest {
        Some((facility, distance)) if draw >= probability => Action::Assign { facility, distance },
        _ => Action::Open,
    };
    Decision { probability, action }
}

/// What happened to one demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// The demand that arrived.
    pub demand: DemandId,
    /// The facility now serving it.
    pub facility: FacilityId,
    /// Whether that facility was opened by this demand.
    pub opened: bool,
    /// Probability of opening that was in effect.
    pub probability: f64,
    /// Cost accrued: the opening cost, or the connection distance.
    pub cost: Cost,
}

/// Facility set and running cost shared by the batch and incremental paths.
#[derive(Debug, Clone)]
pub(crate) struct OnlineState {
    params: OnlineParams,
    solution: Solution,
    total_cost: Cost,
}

impl OnlineState {
    pub(crate) fn new(params: OnlineParams, expected_demands: usize) -> Self {
        Self {
            params,
            solution: Solution::with_capacity(expected_demands),
            total_cost: Cost::ZERO,
        }
    }

    pub(crate) fn step<R: Rng + ?Sized>(&mut self, position: Point, rng: &mut R) -> StepOutcome {
        let decision = consider(&position, self.solution.facilities(), &self.params, rng);
        let demand = self.solution.push_demand(position);
        let (facility, opened, cost) = match decision.action {
            Action::Open => (
                self.solution.open_facility(demand),
                true,
                self.params.opening_cost.as_cost(),
            ),
            Action::Assign { facility, distance } => {
                self.solution.assign(demand, facility);
                (facility, false, Cost::from_distance(distance))
            }
        };
        self.total_cost += cost;
        StepOutcome {
            demand,
            facility,
            opened,
            probability: decision.probability,
            cost,
        }
    }

    pub(crate) const fn params(&self) -> &OnlineParams {
        &self.params
    }

    pub(crate) const fn solution(&self) -> &Solution {
        &self.solution
    }

    pub(crate) const fn total_cost(&self) -> Cost {
        self.total_cost
    }

    pub(crate) fn into_outcome(self) -> OnlineOutcome {
        OnlineOutcome {
            solution: self.solution,
            total_cost: self.total_cost,
        }
    }
}

/// Result of an online run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineOutcome {
    /// Demands and the facilities serving them.
    pub solution: Solution,
    /// Running cost accrued during the run.
    pub total_cost: Cost,
}

/// Runs the online rule over a full stream, in order.
///
/// An empty stream yields no facilities and zero cost.
///
/// # Errors
///
/// Returns `ValidationError::NonFinitePosition` if any position is not finite;
/// nothing is processed in that case.
///
/// # Examples
///
/// ```
/// use facloc::{online, OnlineParams, Point};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let params = OnlineParams::classical(5.0).unwrap();
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let outcome = online::run(&[Point::new(0.0, 0.0)], &params, &mut rng).unwrap();
/// assert_eq!(outcome.solution.facility_count(), 1);
/// assert_eq!(outcome.total_cost.as_f64(), 5.0);
/// ```
pub fn run<R: Rng + ?Sized>(
    stream: &[Point],
    params: &OnlineParams,
    rng: &mut R,
) -> Result<OnlineOutcome, ValidationError> {
    for p in stream {
        p.validate()?;
    }
    let mut state = OnlineState::new(*params, stream.len());
    for &p in stream {
        state.step(p, rng);
    }
    Ok(state.into_outcome())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::cost::total_cost;

    fn cost(v: f64) -> OpeningCost {
        OpeningCost::new(v).unwrap()
    }

    #[test]
    fn params_reject_bad_q() {
        assert!(OnlineParams::new(1.0, 0.0).is_err());
        assert!(OnlineParams::new(1.0, -0.5).is_err());
        assert!(OnlineParams::new(1.0, 1.01).is_err());
        assert!(OnlineParams::new(1.0, f64::NAN).is_err());
        assert!(OnlineParams::new(1.0, 1.0).unwrap().is_classical());
        assert!(!OnlineParams::new(1.0, 0.3).unwrap().is_classical());
    }

    #[test]
    fn params_reject_bad_opening_cost() {
        assert!(matches!(
            OnlineParams::classical(0.0),
            Err(ValidationError::NonPositiveOpeningCost { .. })
        ));
        assert!(OnlineParams::classical(-1.0).is_err());
    }

    #[test]
    fn probability_rounds_before_damping() {
        // 1 / 3 = 0.333.. rounds to 0.333 before q is applied.
        let p = opening_probability(Some(1.0), cost(3.0), 0.5);
        assert_eq!(p, 0.5 * 0.333);
    }

    #[test]
    fn probability_saturates() {
        assert_eq!(opening_probability(Some(141.4214), cost(1.0), 1.0), 1.0);
        assert_eq!(opening_probability(Some(141.4214), cost(1.0), 0.001), 0.001 * 141.421);
    }

    #[test]
    fn nearest_prefers_earliest_on_ties() {
        let mut s = Solution::new();
        let a = s.push_demand(Point::new(-1.0, 0.0));
        let b = s.push_demand(Point::new(1.0, 0.0));
        let fa = s.open_facility(a);
        s.open_facility(b);
        let (id, d) = nearest_facility(&Point::new(0.0, 0.0), s.facilities()).unwrap();
        assert_eq!(id, fa);
        assert_eq!(d, 1.0);
        assert!(nearest_facility(&Point::new(0.0, 0.0), &[]).is_none());
    }

    #[test]
    fn consider_opens_first_demand_even_on_high_draw() {
        // StepRng yielding u64::MAX produces a draw just below 1.0.
        let mut rng = StepRng::new(u64::MAX, 0);
        let params = OnlineParams::classical(1000.0).unwrap();
        let decision = consider(&Point::new(3.0, 3.0), &[], &params, &mut rng);
        assert_eq!(decision.action, Action::Open);
        assert_eq!(decision.probability, 1.0);
    }

    #[test]
    fn consider_reuses_coincident_facility_on_zero_draw() {
        let mut s = Solution::new();
        let a = s.push_demand(Point::new(2.0, 2.0));
        let fa = s.open_facility(a);
        // A zero draw would open whenever probability > 0; at distance 0 it must not.
        let mut rng = StepRng::new(0, 0);
        let params = OnlineParams::classical(10.0).unwrap();
        let decision = consider(&Point::new(2.0, 2.0), s.facilities(), &params, &mut rng);
        assert_eq!(decision.probability, 0.0);
        assert_eq!(
            decision.action,
            Action::Assign {
                facility: fa,
                distance: 0.0
            }
        );
    }

    #[test]
    fn run_single_demand() {
        let params = OnlineParams::classical(5.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = run(&[Point::new(0.0, 0.0)], &params, &mut rng).unwrap();
        assert_eq!(out.solution.facility_count(), 1);
        assert_eq!(out.solution.facilities()[0].position, Point::new(0.0, 0.0));
        assert_eq!(out.total_cost.as_f64(), 5.0);
    }

    #[test]
    fn run_empty_stream() {
        let params = OnlineParams::classical(5.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = run(&[], &params, &mut rng).unwrap();
        assert_eq!(out.solution.facility_count(), 0);
        assert_eq!(out.total_cost, Cost::ZERO);
    }

    #[test]
    fn run_rejects_non_finite_positions() {
        let params = OnlineParams::classical(5.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = run(&[Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)], &params, &mut rng).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinitePosition { .. }));
    }

    #[test]
    fn running_cost_matches_total_cost() {
        let params = OnlineParams::new(7.5, 0.6).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let stream: Vec<Point> = (0..200)
            .map(|i| Point::new(f64::from(i % 17) * 1.37, f64::from(i % 23) * 0.91))
            .collect();
        let out = run(&stream, &params, &mut rng).unwrap();
        assert!(out.solution.is_consistent());
        assert_eq!(out.solution.demand_count(), 200);
        assert_eq!(out.total_cost, total_cost(&out.solution, params.opening_cost()));
    }
}
