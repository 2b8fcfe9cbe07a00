//! Demand stream generators.
//!
//! Generators only sample coordinates; the engines treat their output as an
//! opaque ordered stream. Positions are drawn on the integer grid of the area,
//! bounds included.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geometry::{Area, Point};

/// Produces an ordered stream of demand positions inside an area.
pub trait DemandGenerator: Send + Sync {
    /// Draws `count` positions. Order defines arrival order.
    fn generate(&self, count: usize, area: &Area, rng: &mut dyn RngCore) -> Vec<Point>;
}

/// Uniform sampling over the whole area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformGenerator;

impl DemandGenerator for UniformGenerator {
    fn generate(&self, count: usize, area: &Area, rng: &mut dyn RngCore) -> Vec<Point> {
        let (x_hi, y_hi) = (grid_floor(area.width), grid_floor(area.height));
        (0..count)
            .map(|_| grid_point(rng, (0, x_hi), (0, y_hi)))
            .collect()
    }
}

/// Sampling from a sub-rectangle around the area's center.
///
/// `bias = 0` covers the whole area; values closer to 1 shrink each side of the
/// sampled rectangle to `(1 - bias)` of the area's extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBiasedGenerator {
    bias: f64,
}

impl CenterBiasedGenerator {
    /// Creates a validated generator.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidBias` unless `0 <= bias < 1`.
    pub fn new(bias: f64) -> Result<Self, ValidationError> {
        validate_bias(bias)?;
        Ok(Self { bias })
    }

    /// The bias.
    #[must_use]
    pub const fn bias(&self) -> f64 {
        self.bias
    }

    fn bounds(&self, extent: f64) -> (i64, i64) {
        let center = extent / 2.0;
        let half = extent * (1.0 - self.bias) / 2.0;
        let lo = (center - half).ceil().max(0.0);
        let hi = (center + half).floor().min(extent.floor());
        if lo > hi {
            let mid = center.round();
            return (as_grid(mid), as_grid(mid));
        }
        (as_grid(lo), as_grid(hi))
    }
}

impl DemandGenerator for CenterBiasedGenerator {
    fn generate(&self, count: usize, area: &Area, rng: &mut dyn RngCore) -> Vec<Point> {
        let xs = self.bounds(area.width);
        let ys = self.bounds(area.height);
        (0..count).map(|_| grid_point(rng, xs, ys)).collect()
    }
}

fn validate_bias(bias: f64) -> Result<(), ValidationError> {
    if !(0.0..1.0).contains(&bias) {
        return Err(ValidationError::InvalidBias { value: bias });
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn as_grid(v: f64) -> i64 {
    v as i64
}

fn grid_floor(extent: f64) -> i64 {
    as_grid(extent.floor())
}

#[allow(clippy::cast_precision_loss)]
fn grid_point(rng: &mut dyn RngCore, (x_lo, x_hi): (i64, i64), (y_lo, y_hi): (i64, i64)) -> Point {
    let x = rng.gen_range(x_lo..=x_hi);
    let y = rng.gen_range(y_lo..=y_hi);
    Point::new(x as f64, y as f64)
}

/// Serializable generator selection used by experiment configs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GeneratorKind {
    /// [`UniformGenerator`].
    #[default]
    Uniform,
    /// [`CenterBiasedGenerator`].
    CenterBiased {
        /// Narrowing factor in `[0, 1)`.
        bias: f64,
    },
}

impl GeneratorKind {
    /// Validate the selection.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidBias` unless `0 <= bias < 1`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Uniform => Ok(()),
            Self::CenterBiased { bias } => validate_bias(*bias),
        }
    }
}

impl DemandGenerator for GeneratorKind {
    fn generate(&self, count: usize, area: &Area, rng: &mut dyn RngCore) -> Vec<Point> {
        match *self {
            Self::Uniform => UniformGenerator.generate(count, area, rng),
            Self::CenterBiased { bias } => CenterBiasedGenerator { bias }.generate(count, area, rng),
        }
    }
}
