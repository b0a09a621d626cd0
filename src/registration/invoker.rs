//! Runs the registration engine over the sampled frames.

use glam::DVec2;
use tracing::{debug, info};

use super::engine::{Registrar, RegistrationError};
use crate::error::{Result, StabilizeError};
use crate::stack::Frame;
use crate::trajectory::TransformSample;

/// Registration results for the sampled frames, in sampling order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredSamples {
    /// Positions (within the processed run) of the registered frames.
    pub indices: Vec<usize>,
    /// One sample per entry of `indices`.
    pub samples: Vec<TransformSample>,
    /// Center of rotation reported by the last registration.
    pub center: DVec2,
}

/// Registers `frames[i]` against `reference` for every `i` in `indices`.
///
/// The batch goes to [`Registrar::register_all`]. Any failure, including a
/// result with non-finite parameters, aborts the run; the earliest failing
/// frame in sampling order is reported with its stack index.
pub fn register_sampled<R: Registrar + ?Sized>(
    registrar: &R,
    frames: &[Frame],
    reference: &Frame,
    indices: &[usize],
) -> Result<RegisteredSamples> {
    let Some(&last) = indices.last() else {
        return Err(StabilizeError::InvalidInput(
            "no frames selected for registration".into(),
        ));
    };
    if let Some(&bad) = indices.iter().find(|&&i| i >= frames.len()) {
        return Err(StabilizeError::InvalidInput(format!(
            "sampled index {bad} is outside a run of {} frames",
            frames.len()
        )));
    }

    info!(
        count = indices.len(),
        reference = reference.index(),
        "Registering sampled frames"
    );

    let moving: Vec<&Frame> = indices.iter().map(|&i| &frames[i]).collect();
    let results = registrar.register_all(reference, &moving);
    if results.len() != moving.len() {
        return Err(StabilizeError::InvalidInput(format!(
            "registrar returned {} results for {} frames",
            results.len(),
            moving.len()
        )));
    }

    let mut center = DVec2::ZERO;
    let mut samples = Vec::with_capacity(results.len());
    for ((&i, frame), result) in indices.iter().zip(moving).zip(results) {
        let failure = |source: RegistrationError| StabilizeError::RegistrationFailure {
            index: frame.index(),
            source,
        };
        let reg = result.map_err(failure)?;
        let TransformSample { angle, tx, ty } = reg.sample;
        if !reg.sample.is_finite() {
            return Err(failure(RegistrationError::NonFinite { angle, tx, ty }));
        }

        debug!(frame = frame.index(), angle, tx, ty, "Frame registered");
        if i == last {
            center = reg.center;
        }
        samples.push(reg.sample);
    }

    Ok(RegisteredSamples {
        indices: indices.to_vec(),
        samples,
        center,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::registration::ScriptedRegistrar;

    fn run(n: usize) -> Vec<Frame> {
        (0..n).map(|i| Frame::new(vec![1.0; 4], 2, 2, i)).collect()
    }

    #[test]
    fn test_samples_in_sampling_order() {
        let frames = run(12);
        let registrar = ScriptedRegistrar::new(DVec2::new(0.5, 0.5))
            .with_fn([0, 3, 6, 9], |i| TransformSample::splat(i as f64));

        let out = register_sampled(&registrar, &frames, &frames[6], &[0, 3, 6, 9]).unwrap();

        assert_eq!(out.indices, vec![0, 3, 6, 9]);
        let values: Vec<f64> = out.samples.iter().map(|s| s.tx).collect();
        assert_eq!(values, vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(out.center, DVec2::new(0.5, 0.5));
        assert_eq!(registrar.calls(), 4);
    }

    #[test]
    fn test_failure_reports_stack_index() {
        // Frames carry their position in a larger stack
        let frames: Vec<Frame> = (0..6)
            .map(|i| Frame::new(vec![1.0; 4], 2, 2, 20 + i))
            .collect();
        let registrar = ScriptedRegistrar::new(DVec2::ZERO)
            .with_sample(20, TransformSample::IDENTITY);

        let err = register_sampled(&registrar, &frames, &frames[3], &[0, 3]).unwrap_err();
        assert!(matches!(
            err,
            StabilizeError::RegistrationFailure { index: 23, .. }
        ));
    }

    #[test]
    fn test_non_finite_result_is_registration_failure() {
        let frames = run(12);
        let registrar = ScriptedRegistrar::new(DVec2::ZERO)
            .with_fn([0, 3, 9], |_| TransformSample::IDENTITY)
            .with_sample(6, TransformSample::new(f64::NAN, 1.0, 2.0));

        let err = register_sampled(&registrar, &frames, &frames[6], &[0, 3, 6, 9]).unwrap_err();

        assert_eq!(err.stage(), Stage::Registration);
        assert_eq!(err.frame_index(), Some(6));
        assert!(matches!(
            err,
            StabilizeError::RegistrationFailure {
                index: 6,
                source: RegistrationError::NonFinite { .. },
            }
        ));
    }

    #[test]
    fn test_earliest_failure_reported() {
        let frames = run(12);
        let registrar =
            ScriptedRegistrar::new(DVec2::ZERO).with_sample(0, TransformSample::IDENTITY);

        let err = register_sampled(&registrar, &frames, &frames[6], &[0, 3, 6, 9]).unwrap_err();
        assert_eq!(err.frame_index(), Some(3));
        assert_eq!(registrar.calls(), 4);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let frames = run(3);
        let registrar = ScriptedRegistrar::new(DVec2::ZERO);
        let result = register_sampled(&registrar, &frames, &frames[1], &[]);
        assert!(matches!(result, Err(StabilizeError::InvalidInput(_))));
        assert_eq!(registrar.calls(), 0);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let frames = run(3);
        let registrar = ScriptedRegistrar::new(DVec2::ZERO);
        let result = register_sampled(&registrar, &frames, &frames[1], &[0, 3]);
        assert!(matches!(result, Err(StabilizeError::InvalidInput(_))));
    }
}
