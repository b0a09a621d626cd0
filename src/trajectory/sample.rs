//! Per-frame rigid motion parameters and sparse slots.

use std::ops::{Add, Div, Mul, Sub};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Rigid motion parameters for one frame: rotation angle (radians) and
/// translation in pixels.
///
/// Arithmetic is component-wise, which is what interpolation and averaging
/// of trajectories need.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformSample {
    /// Rotation angle in radians.
    pub angle: f64,
    /// Translation along x in pixels.
    pub tx: f64,
    /// Translation along y in pixels.
    pub ty: f64,
}

impl TransformSample {
    /// The identity motion.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0);

    /// Number of scalar parameters.
    pub const COMPONENTS: usize = 3;

    /// Creates a sample from its three parameters.
    pub const fn new(angle: f64, tx: f64, ty: f64) -> Self {
        Self { angle, tx, ty }
    }

    /// Creates a sample with every parameter set to `value`.
    pub const fn splat(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Parameters as `[angle, tx, ty]`.
    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.angle, self.tx, self.ty]
    }

    /// Builds a sample from `[angle, tx, ty]`.
    #[inline]
    pub fn from_array(params: [f64; 3]) -> Self {
        Self::new(params[0], params[1], params[2])
    }

    /// Translation part as a vector.
    #[inline]
    pub fn translation(&self) -> DVec2 {
        DVec2::new(self.tx, self.ty)
    }

    /// Returns true if every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.angle.is_finite() && self.tx.is_finite() && self.ty.is_finite()
    }
}

impl Add for TransformSample {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.angle + rhs.angle, self.tx + rhs.tx, self.ty + rhs.ty)
    }
}

impl Sub for TransformSample {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.angle - rhs.angle, self.tx - rhs.tx, self.ty - rhs.ty)
    }
}

impl Mul<f64> for TransformSample {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.angle * rhs, self.tx * rhs, self.ty * rhs)
    }
}

impl Div<f64> for TransformSample {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.angle / rhs, self.tx / rhs, self.ty / rhs)
    }
}

/// One position of a sparse trajectory.
///
/// Frames that were not registered hold `Unknown`; there is no numeric
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Slot {
    /// A registered sample.
    Known(TransformSample),
    /// No sample for this frame.
    #[default]
    Unknown,
}

impl Slot {
    /// Returns the sample if the slot is known.
    #[inline]
    pub fn known(&self) -> Option<TransformSample> {
        match self {
            Slot::Known(sample) => Some(*sample),
            Slot::Unknown => None,
        }
    }

    /// Returns true for `Known` slots.
    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self, Slot::Known(_))
    }
}
