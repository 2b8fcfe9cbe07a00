//! Planar geometry primitives.
//!
//! Distances are rounded to a fixed precision before they are returned. Every
//! probability and cost computation downstream works on the rounded value, so
//! two points closer than the precision are treated as coincident.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Decimal places kept by [`distance`].
pub const DISTANCE_PRECISION: u32 = 4;

/// Decimal places kept for the normalized distance fed into the opening probability.
pub const PROBABILITY_PRECISION: u32 = 3;

/// Rounds `value` to `decimals` fractional digits, ties to even.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    #[allow(clippy::cast_possible_wrap)]
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// A position in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Validates that both coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NonFinitePosition` otherwise.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_finite() {
            return Err(ValidationError::NonFinitePosition {
                x: self.x,
                y: self.y,
            });
        }
        Ok(())
    }

    /// Coordinate-wise arithmetic mean of `points`, or `None` when empty.
    #[must_use]
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Point> {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0usize;
        for p in points {
            sum_x += p.x;
            sum_y += p.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        Some(Point::new(sum_x / n, sum_y / n))
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Euclidean distance between `p` and `q`, rounded to [`DISTANCE_PRECISION`] decimals.
///
/// # Examples
///
/// ```
/// use facloc::{distance, Point};
///
/// let d = distance(&Point::new(0.0, 0.0), &Point::new(1.0, 1.0));
/// assert_eq!(d, 1.4142);
/// ```
#[must_use]
pub fn distance(p: &Point, q: &Point) -> f64 {
    let dx = p.x - q.x;
    let dy = p.y - q.y;
    round_to((dx * dx + dy * dy).sqrt(), DISTANCE_PRECISION)
}

/// The rectangular region `[0, width] x [0, height]` demands arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Default for Area {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
        }
    }
}

impl Area {
    /// Creates a validated area.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidArea` unless both extents are positive and finite.
    pub fn new(width: f64, height: f64) -> Result<Self, ValidationError> {
        let area = Self { width, height };
        area.validate()?;
        Ok(area)
    }

    /// Validates the extents.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidArea` unless both extents are positive and finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.width) || !ok(self.height) {
            return Err(ValidationError::InvalidArea {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Returns true if `p` lies inside the area, bounds included.
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    /// The center of the area.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Number of unit grid cells covered by the area.
    #[must_use]
    pub fn grid_size(&self) -> f64 {
        self.width.floor() * self.height.floor()
    }

    /// Draws a uniformly random position inside the area.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point::new(
            rng.gen_range(0.0..=self.width),
            rng.gen_range(0.0..=self.height),
        )
    }
}
