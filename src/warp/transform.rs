//! Rigid 2D transforms about a fixed center of rotation.

use glam::{DAffine2, DMat2, DVec2};

use crate::trajectory::TransformSample;

/// Rotation about `center` followed by a translation.
///
/// Maps a point `p` of the output (reference) geometry to the source point
/// `R(angle) * (p - center) + center + translation`, which is where the
/// resampler reads from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Rotation angle in radians.
    pub angle: f64,
    /// Translation in pixels.
    pub translation: DVec2,
    /// Center of rotation in pixels.
    pub center: DVec2,
}

impl RigidTransform {
    /// Identity transform about `center`.
    pub fn identity(center: DVec2) -> Self {
        Self {
            angle: 0.0,
            translation: DVec2::ZERO,
            center,
        }
    }

    /// Transform for one trajectory sample.
    pub fn from_sample(sample: &TransformSample, center: DVec2) -> Self {
        Self {
            angle: sample.angle,
            translation: sample.translation(),
            center,
        }
    }

    /// Equivalent affine map `p -> M p + o`.
    ///
    /// With a zero angle the linear part is exactly the identity and the
    /// offset exactly the translation.
    pub fn to_affine(&self) -> DAffine2 {
        let rotation = DMat2::from_angle(self.angle);
        let offset = self.center + self.translation - rotation * self.center;
        DAffine2::from_mat2_translation(rotation, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_is_exact() {
        let t = RigidTransform::identity(DVec2::new(31.7, 12.3)).to_affine();
        for &(x, y) in &[(0.0, 0.0), (5.0, 9.0), (63.0, 47.0)] {
            let p = DVec2::new(x, y);
            assert_eq!(t.transform_point2(p), p);
        }
    }

    #[test]
    fn test_center_fixed_under_rotation() {
        let center = DVec2::new(10.0, 20.0);
        let t = RigidTransform {
            angle: 0.7,
            translation: DVec2::ZERO,
            center,
        };
        let mapped = t.to_affine().transform_point2(center);
        assert_relative_eq!(mapped.x, center.x, epsilon = 1e-12);
        assert_relative_eq!(mapped.y, center.y, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_turn_about_center() {
        let t = RigidTransform {
            angle: FRAC_PI_2,
            translation: DVec2::new(1.0, -2.0),
            center: DVec2::new(5.0, 5.0),
        };
        // (6, 5) is one pixel right of center; a quarter turn sends it below
        let mapped = t.to_affine().transform_point2(DVec2::new(6.0, 5.0));
        assert_relative_eq!(mapped.x, 5.0 + 1.0, epsilon = 1e-12);
        assert_relative_eq!(mapped.y, 6.0 - 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_sample() {
        let sample = TransformSample::new(0.1, 2.0, -3.0);
        let t = RigidTransform::from_sample(&sample, DVec2::new(4.0, 4.0));
        assert_eq!(t.angle, 0.1);
        assert_eq!(t.translation, DVec2::new(2.0, -3.0));
        assert_eq!(t.center, DVec2::new(4.0, 4.0));
    }
}
