//! Rigid registration from image moments.
//!
//! Each frame is summarised by its intensity-weighted centroid and the
//! orientation of its principal axis. The rigid transform maps the fixed
//! centroid onto the moving one and turns the fixed principal axis onto the
//! moving one. This is a coarse global estimate; it assumes the whole field
//! of view moves rigidly and that the principal axis is well defined.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::{DMat2, DVec2};
use rayon::prelude::*;

use super::engine::{Registrar, Registration, RegistrationError};
use crate::config::RegistrationConfig;
use crate::stack::Frame;
use crate::trajectory::TransformSample;

/// First and second order moments of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMoments {
    /// Total intensity.
    pub mass: f64,
    /// Intensity-weighted centroid in pixels.
    pub centroid: DVec2,
    /// Principal axis angle in radians, in `(-pi/2, pi/2]`.
    pub orientation: f64,
}

impl ImageMoments {
    /// Computes moments, treating negative samples as zero.
    pub fn compute(frame: &Frame) -> Self {
        let mut mass = 0.0;
        let mut sum = DVec2::ZERO;
        for (x, y, v) in frame.enumerate_pixels() {
            let w = v.max(0.0) as f64;
            mass += w;
            sum += DVec2::new(x as f64, y as f64) * w;
        }

        if mass <= 0.0 {
            return Self {
                mass: 0.0,
                centroid: DVec2::ZERO,
                orientation: 0.0,
            };
        }

        let centroid = sum / mass;
        let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
        for (x, y, v) in frame.enumerate_pixels() {
            let w = v.max(0.0) as f64;
            let d = DVec2::new(x as f64, y as f64) - centroid;
            mu20 += w * d.x * d.x;
            mu02 += w * d.y * d.y;
            mu11 += w * d.x * d.y;
        }

        Self {
            mass,
            centroid,
            orientation: 0.5 * (2.0 * mu11).atan2(mu20 - mu02),
        }
    }
}

/// Wraps an axis angle difference into `(-pi/2, pi/2]`.
fn wrap_axis_angle(angle: f64) -> f64 {
    let mut a = angle % PI;
    if a > FRAC_PI_2 {
        a -= PI;
    } else if a <= -FRAC_PI_2 {
        a += PI;
    }
    a
}

/// Registrar estimating rotation and translation from image moments.
///
/// The center of rotation is the geometric center of the fixed frame.
#[derive(Debug, Clone)]
pub struct MomentRegistrar {
    estimate_rotation: bool,
    min_mass: f64,
}

impl MomentRegistrar {
    /// Creates a registrar from its configuration table.
    pub fn new(config: &RegistrationConfig) -> Self {
        Self {
            estimate_rotation: config.estimate_rotation,
            min_mass: config.min_mass,
        }
    }

    fn moments(&self, frame: &Frame) -> Result<ImageMoments, RegistrationError> {
        let moments = ImageMoments::compute(frame);
        if moments.mass <= self.min_mass {
            return Err(RegistrationError::EmptyImage {
                mass: moments.mass,
            });
        }
        Ok(moments)
    }

    /// Registers `moving` against a fixed frame whose moments are known.
    fn register_with(
        &self,
        fixed: &Frame,
        f: &ImageMoments,
        moving: &Frame,
    ) -> Result<Registration, RegistrationError> {
        if fixed.geometry() != moving.geometry() {
            return Err(RegistrationError::ShapeMismatch {
                fixed: fixed.geometry(),
                moving: moving.geometry(),
            });
        }

        let m = self.moments(moving)?;

        let center = DVec2::new(
            (fixed.width() as f64 - 1.0) / 2.0,
            (fixed.height() as f64 - 1.0) / 2.0,
        );
        let angle = if self.estimate_rotation {
            wrap_axis_angle(m.orientation - f.orientation)
        } else {
            0.0
        };

        // R (f_c - c) + c + t = m_c
        let translation = m.centroid - center - DMat2::from_angle(angle) * (f.centroid - center);

        tracing::trace!(
            moving = moving.index(),
            angle,
            tx = translation.x,
            ty = translation.y,
            "Moment registration"
        );

        Ok(Registration {
            sample: TransformSample::new(angle, translation.x, translation.y),
            center,
        })
    }
}

impl Default for MomentRegistrar {
    fn default() -> Self {
        Self::new(&RegistrationConfig::default())
    }
}

impl Registrar for MomentRegistrar {
    fn register(&self, fixed: &Frame, moving: &Frame) -> Result<Registration, RegistrationError> {
        let f = self.moments(fixed)?;
        self.register_with(fixed, &f, moving)
    }

    /// Computes the fixed frame's moments once for the whole batch.
    fn register_all(
        &self,
        fixed: &Frame,
        moving: &[&Frame],
    ) -> Vec<Result<Registration, RegistrationError>> {
        match self.moments(fixed) {
            Ok(f) => moving
                .par_iter()
                .map(|frame| self.register_with(fixed, &f, frame))
                .collect(),
            Err(e) => moving.iter().map(|_| Err(e.clone())).collect(),
        }
    }
}
