//! Incremental online session.
//!
//! A session owns the area, the parameters, its random source and the
//! accumulated facility set, and advances one demand at a time so callers can
//! observe the state after every arrival.

use rand::Rng;

use crate::cost::Cost;
use crate::entity::{Demand, Facility, Solution};
use crate::error::ValidationError;
use crate::geometry::{Area, Point};

use super::{OnlineOutcome, OnlineParams, OnlineState, StepOutcome};

/// Stateful Meyerson session driven by [`MeyersonSession::add_demand`].
///
/// # Examples
///
/// ```
/// use facloc::{Area, MeyersonSession, OnlineParams, Point};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let area = Area::new(25.0, 25.0).unwrap();
/// let params = OnlineParams::new(35.0, 1.0).unwrap();
/// let mut session = MeyersonSession::new(area, params, ChaCha8Rng::seed_from_u64(7)).unwrap();
///
/// let step = session.add_demand(Point::new(3.0, 4.0)).unwrap();
/// assert!(step.opened);
/// assert_eq!(session.facilities().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MeyersonSession<R> {
    area: Area,
    state: OnlineState,
    rng: R,
}

impl<R: Rng> MeyersonSession<R> {
    /// Creates an empty session.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidArea` if the area is degenerate.
    pub fn new(area: Area, params: OnlineParams, rng: R) -> Result<Self, ValidationError> {
        area.validate()?;
        Ok(Self {
            area,
            state: OnlineState::new(params, 0),
            rng,
        })
    }

    /// Processes the next demand.
    ///
    /// The running cost grows by exactly the cost of this step and always
    /// equals [`crate::total_cost`] over the accumulated facilities.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the position is not finite or lies
    /// outside the session's area. The session is unchanged in that case.
    pub fn add_demand(&mut self, position: Point) -> Result<StepOutcome, ValidationError> {
        position.validate()?;
        if !self.area.contains(&position) {
            return Err(ValidationError::PositionOutsideArea {
                x: position.x,
                y: position.y,
                width: self.area.width,
                height: self.area.height,
            });
        }
        Ok(self.state.step(position, &mut self.rng))
    }

    /// Processes every position of `stream` in order.
    ///
    /// # Errors
    ///
    /// Stops at the first rejected position, as [`MeyersonSession::add_demand`]
    /// would reject it; earlier steps stay applied.
    pub fn extend<I>(&mut self, stream: I) -> Result<Vec<StepOutcome>, ValidationError>
    where
        I: IntoIterator<Item = Point>,
    {
        stream.into_iter().map(|p| self.add_demand(p)).collect()
    }
}

impl<R> MeyersonSession<R> {
    /// The area demands must fall in.
    #[must_use]
    pub const fn area(&self) -> Area {
        self.area
    }

    /// The rule parameters.
    #[must_use]
    pub const fn params(&self) -> &OnlineParams {
        self.state.params()
    }

    /// Cost accrued so far.
    #[must_use]
    pub const fn total_cost(&self) -> Cost {
        self.state.total_cost()
    }

    /// Demands and facilities so far.
    #[must_use]
    pub const fn solution(&self) -> &Solution {
        self.state.solution()
    }

    /// Demands seen so far, in arrival order.
    #[must_use]
    pub fn demands(&self) -> &[Demand] {
        self.state.solution().demands()
    }

    /// Facilities opened so far, in creation order.
    #[must_use]
    pub fn facilities(&self) -> &[Facility] {
        self.state.solution().facilities()
    }

    /// Ends the session, returning the accumulated result.
    #[must_use]
    pub fn finish(self) -> OnlineOutcome {
        self.state.into_outcome()
    }
}
