//! Cost model.
//!
//! Costs are fixed point at [`DISTANCE_PRECISION`] decimals. Every term that
//! enters a total (an opening charge or a rounded connection distance) is
//! exactly representable, so a running total kept while streaming and a total
//! recomputed from the final facility set are the same integer.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use crate::entity::Solution;
use crate::error::ValidationError;
use crate::geometry::{distance, DISTANCE_PRECISION};

/// Number of fixed-point units per whole cost unit.
const UNITS_PER_WHOLE: f64 = 10_000.0;

/// A non-negative cost amount with [`DISTANCE_PRECISION`] decimals.
///
/// Serializes as a plain floating-point number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Cost(u64);

impl Cost {
    /// The zero cost.
    pub const ZERO: Self = Self(0);

    /// Converts a non-negative finite amount, rounding to the cost precision.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidCost` for negative or non-finite input.
    pub fn from_f64(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidCost { value });
        }
        Ok(Self::from_rounded(value))
    }

    /// Converts an already-rounded distance.
    #[must_use]
    pub fn from_distance(d: f64) -> Self {
        Self::from_rounded(d)
    }

    fn from_rounded(value: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let units = (value * UNITS_PER_WHOLE).round_ties_even().max(0.0) as u64;
        Self(units)
    }

    /// Raw fixed-point units.
    #[must_use]
    pub const fn units(self) -> u64 {
        self.0
    }

    /// The amount as a floating-point number.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let units = self.0 as f64;
        units / UNITS_PER_WHOLE
    }
}

impl Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<usize> for Cost {
    type Output = Self;

    fn mul(self, rhs: usize) -> Self {
        Self(self.0 * rhs as u64)
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Cost> for f64 {
    fn from(cost: Cost) -> Self {
        cost.as_f64()
    }
}

impl TryFrom<f64> for Cost {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_f64(value)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", DISTANCE_PRECISION as usize, self.as_f64())
    }
}

/// The fixed charge for opening one facility.
///
/// Always positive and representable at the cost precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct OpeningCost {
    value: f64,
    cost: Cost,
}

impl OpeningCost {
    /// Smallest accepted opening cost.
    pub const MIN: f64 = 1.0 / UNITS_PER_WHOLE;

    /// Creates a validated opening cost.
    ///
    /// The value is quantized to the cost precision (ties to even) and the
    /// quantized value is what the opening probability and every total use:
    /// `12.34567` is stored as `12.3457`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonPositiveOpeningCost` for zero, negative, or
    /// non-finite values and `ValidationError::OpeningCostBelowPrecision` for
    /// values that would round to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use facloc::OpeningCost;
    ///
    /// assert!(OpeningCost::new(40.0).is_ok());
    /// assert!(OpeningCost::new(0.0).is_err());
    /// ```
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::NonPositiveOpeningCost { value });
        }
        let cost = Cost::from_rounded(value);
        if cost == Cost::ZERO {
            return Err(ValidationError::OpeningCostBelowPrecision {
                value,
                min: Self::MIN,
            });
        }
        Ok(Self {
            value: cost.as_f64(),
            cost,
        })
    }

    /// The opening cost as a floating-point number.
    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.value
    }

    /// The opening cost as a fixed-point [`Cost`].
    #[must_use]
    pub const fn as_cost(self) -> Cost {
        self.cost
    }
}

impl TryFrom<f64> for OpeningCost {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OpeningCost> for f64 {
    fn from(cost: OpeningCost) -> Self {
        cost.value
    }
}

impl fmt::Display for OpeningCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Total cost of a solution: one opening charge per facility plus the rounded
/// distance from every served demand to its facility.
///
/// This is the single authoritative score used by every strategy and by the
/// experiment harness.
#[must_use]
pub fn total_cost(solution: &Solution, opening_cost: OpeningCost) -> Cost {
    let opening = opening_cost.as_cost() * solution.facility_count();
    let connection: Cost = solution
        .facilities()
        .iter()
        .flat_map(|f| {
            solution
                .served_positions(f)
                .map(move |p| Cost::from_distance(distance(&f.position, &p)))
        })
        .sum();
    opening + connection
}
