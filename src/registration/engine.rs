//! Registration engine abstraction.
//!
//! The pipeline only needs the rigid parameters aligning a moving frame to
//! the fixed reference and the center they rotate about. How they are found
//! is up to the engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::DVec2;
use rayon::prelude::*;
use thiserror::Error;

use crate::stack::{Frame, Geometry};
use crate::trajectory::TransformSample;

/// Errors that can occur during registration.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("frame sizes differ: fixed {fixed:?}, moving {moving:?}")]
    ShapeMismatch { fixed: Geometry, moving: Geometry },
    #[error("image has too little signal to register (total intensity {mass})")]
    EmptyImage { mass: f64 },
    #[error("registration produced non-finite parameters (angle {angle}, tx {tx}, ty {ty})")]
    NonFinite { angle: f64, tx: f64, ty: f64 },
    #[error("registration engine failed: {0}")]
    Engine(String),
}

/// Result of registering one moving frame against the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Registration {
    /// Rotation and translation mapping reference coordinates into the
    /// moving frame.
    pub sample: TransformSample,
    /// Center of rotation used by `sample`.
    pub center: DVec2,
}

/// Trait for registration engines.
///
/// The pipeline calls `register` concurrently for different moving frames
/// against the same fixed frame, so implementations must be `Sync`.
pub trait Registrar: Sync {
    /// Estimates the rigid transform aligning `moving` to `fixed`.
    fn register(&self, fixed: &Frame, moving: &Frame) -> Result<Registration, RegistrationError>;

    /// Registers every frame of `moving` against `fixed`.
    ///
    /// Returns one result per moving frame, in order. The default runs
    /// `register` on the rayon pool; engines that can reuse work on the
    /// fixed frame override it.
    fn register_all(
        &self,
        fixed: &Frame,
        moving: &[&Frame],
    ) -> Vec<Result<Registration, RegistrationError>> {
        moving
            .par_iter()
            .map(|frame| self.register(fixed, frame))
            .collect()
    }
}

/// Registrar returning predetermined samples keyed by the moving frame's
/// stack index.
///
/// Useful for exercising the pipeline without running a real engine.
/// Frames without a scripted sample fail with `RegistrationError::Engine`.
#[derive(Debug, Default)]
pub struct ScriptedRegistrar {
    samples: HashMap<usize, TransformSample>,
    center: DVec2,
    calls: AtomicUsize,
}

impl ScriptedRegistrar {
    /// Creates a registrar reporting `center` with every sample.
    pub fn new(center: DVec2) -> Self {
        Self {
            center,
            ..Default::default()
        }
    }

    /// Scripts `sample` for the frame with stack index `index`.
    pub fn with_sample(mut self, index: usize, sample: TransformSample) -> Self {
        self.samples.insert(index, sample);
        self
    }

    /// Scripts `f(index)` for every index in `indices`.
    pub fn with_fn(
        mut self,
        indices: impl IntoIterator<Item = usize>,
        f: impl Fn(usize) -> TransformSample,
    ) -> Self {
        for index in indices {
            self.samples.insert(index, f(index));
        }
        self
    }

    /// Number of `register` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Registrar for ScriptedRegistrar {
    fn register(&self, fixed: &Frame, moving: &Frame) -> Result<Registration, RegistrationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if fixed.geometry() != moving.geometry() {
            return Err(RegistrationError::ShapeMismatch {
                fixed: fixed.geometry(),
                moving: moving.geometry(),
            });
        }

        let sample = self.samples.get(&moving.index()).copied().ok_or_else(|| {
            RegistrationError::Engine(format!("no sample scripted for frame {}", moving.index()))
        })?;

        Ok(Registration {
            sample,
            center: self.center,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(index: usize) -> Frame {
        Frame::new(vec![0.0; 16], 4, 4, index)
    }

    #[test]
    fn test_scripted_lookup() {
        let registrar = ScriptedRegistrar::new(DVec2::new(1.5, 1.5))
            .with_sample(3, TransformSample::new(0.1, 2.0, 3.0));

        let reg = registrar.register(&blank(1), &blank(3)).unwrap();
        assert_eq!(reg.sample, TransformSample::new(0.1, 2.0, 3.0));
        assert_eq!(reg.center, DVec2::new(1.5, 1.5));
        assert_eq!(registrar.calls(), 1);
    }

    #[test]
    fn test_unscripted_frame_fails() {
        let registrar = ScriptedRegistrar::new(DVec2::ZERO);
        let result = registrar.register(&blank(0), &blank(6));
        assert!(matches!(result, Err(RegistrationError::Engine(_))));
        assert_eq!(registrar.calls(), 1);
    }

    #[test]
    fn test_register_all_keeps_order() {
        let registrar = ScriptedRegistrar::new(DVec2::ZERO)
            .with_fn([3, 6], |i| TransformSample::splat(i as f64));
        let (a, b, c) = (blank(6), blank(9), blank(3));

        let results = registrar.register_all(&blank(0), &[&a, &b, &c]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().sample, TransformSample::splat(6.0));
        assert!(matches!(results[1], Err(RegistrationError::Engine(_))));
        assert_eq!(results[2].as_ref().unwrap().sample, TransformSample::splat(3.0));
        assert_eq!(registrar.calls(), 3);
    }

    #[test]
    fn test_with_fn_scripts_each_index() {
        let registrar = ScriptedRegistrar::new(DVec2::ZERO)
            .with_fn([0, 3, 6], |i| TransformSample::splat(i as f64));
        let reg = registrar.register(&blank(0), &blank(6)).unwrap();
        assert_eq!(reg.sample, TransformSample::splat(6.0));
    }
}
