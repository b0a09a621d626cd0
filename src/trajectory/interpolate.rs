//! Phase-staggered dual interpolation.
//!
//! Registration only runs on every `s`-th frame and each estimate carries its
//! own noise. Instead of interpolating the stride-`s` sequence directly, the
//! samples are split into two phases of period `2s`, each phase is densified
//! independently by piecewise-linear interpolation, and the two dense
//! trajectories are averaged.

use tracing::{debug, warn};

use super::dense::DenseTrajectory;
use super::sample::TransformSample;
use super::sparse::{PhaseArray, SparseTrajectory};
use crate::error::{Result, StabilizeError};

/// Densifies one phase array.
///
/// - positions before the first anchor are extrapolated backwards along the
///   slope of the first two anchors;
/// - gaps between consecutive anchors are filled linearly;
/// - positions after the last anchor are extrapolated forwards along the
///   slope of the last two anchors.
///
/// Anchor values are copied through unchanged. A phase with a single anchor
/// has no slope and is held constant at that anchor. A phase without anchors
/// fails with [`StabilizeError::InsufficientSamples`].
pub fn fill_phase(array: &PhaseArray) -> Result<DenseTrajectory> {
    let anchors: Vec<(usize, TransformSample)> = array.anchors().collect();
    let period = array.period() as f64;

    let Some(&(first_idx, first)) = anchors.first() else {
        return Err(StabilizeError::InsufficientSamples {
            phase: array.phase(),
        });
    };

    let mut values = vec![first; array.len()];

    if anchors.len() == 1 {
        warn!(
            phase = %array.phase(),
            anchor = first_idx,
            frames = array.len(),
            "Single registered sample in phase, holding it constant"
        );
        return Ok(DenseTrajectory::new(values));
    }

    // Leading gap
    let second = anchors[1].1;
    for (k, value) in values.iter_mut().enumerate().take(first_idx) {
        let t = (first_idx - k) as f64 / period;
        *value = first - (second - first) * t;
    }

    // Interior gaps
    for pair in anchors.windows(2) {
        let (i, a) = pair[0];
        let (j, b) = pair[1];
        values[i] = a;
        for (offset, value) in values[i + 1..j].iter_mut().enumerate() {
            let t = (offset + 1) as f64 / period;
            *value = a + (b - a) * t;
        }
    }

    // Trailing remainder
    let (last_idx, last) = anchors[anchors.len() - 1];
    let prev = anchors[anchors.len() - 2].1;
    values[last_idx] = last;
    for (offset, value) in values[last_idx + 1..].iter_mut().enumerate() {
        let t = (offset + 1) as f64 / period;
        *value = last + (last - prev) * t;
    }

    debug!(
        phase = %array.phase(),
        anchors = anchors.len(),
        leading = first_idx,
        trailing = array.len() - last_idx - 1,
        "Filled phase"
    );

    Ok(DenseTrajectory::new(values))
}

/// Reconstructs a dense trajectory from a sparse one by filling both phases
/// and averaging them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseStaggeredInterpolator;

impl PhaseStaggeredInterpolator {
    /// Creates the interpolator.
    pub fn new() -> Self {
        Self
    }

    /// Fills each phase independently.
    pub fn fill_phases(
        &self,
        sparse: &SparseTrajectory,
    ) -> Result<(DenseTrajectory, DenseTrajectory)> {
        let (first, second) = sparse.split();
        Ok((fill_phase(&first)?, fill_phase(&second)?))
    }

    /// Fills both phases and returns their element-wise mean.
    pub fn reconstruct(&self, sparse: &SparseTrajectory) -> Result<DenseTrajectory> {
        let (first, second) = self.fill_phases(sparse)?;
        DenseTrajectory::average(&first, &second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::Phase;
    use proptest::prelude::*;

    fn sparse_from(len: usize, samples: &[TransformSample]) -> SparseTrajectory {
        SparseTrajectory::from_samples(len, 3, samples).unwrap()
    }

    #[test]
    fn test_twelve_frame_scenario() {
        let samples: Vec<_> = (0..4).map(|k| TransformSample::splat(k as f64)).collect();
        let sparse = sparse_from(12, &samples);

        let interpolator = PhaseStaggeredInterpolator::new();
        let (first, second) = interpolator.fill_phases(&sparse).unwrap();

        // First phase: linear between (0,0,0) at 0 and (2,2,2) at 6
        for i in 1..6 {
            let expected = 2.0 * i as f64 / 6.0;
            assert!((first[i].angle - expected).abs() < 1e-12);
        }
        // ... then extrapolated past 6 with the same slope
        assert!((first[11].tx - 2.0 * 11.0 / 6.0).abs() < 1e-12);

        // Second phase: backward extrapolation from 3 and 9
        assert_eq!(second[0], TransformSample::IDENTITY);

        let combined = interpolator.reconstruct(&sparse).unwrap();
        assert_eq!(combined[0], TransformSample::splat(0.0));
        assert_eq!(combined[6], TransformSample::splat(2.0));
    }

    #[test]
    fn test_short_run_fully_dense() {
        let samples: Vec<_> = (0..3).map(|k| TransformSample::splat(k as f64)).collect();
        let sparse = sparse_from(9, &samples);

        let (first, second) = PhaseStaggeredInterpolator::new().fill_phases(&sparse).unwrap();
        assert_eq!(first.len(), 9);
        assert!(first.iter().all(TransformSample::is_finite));

        // Trailing remainder after anchor 6 follows the 0 -> 6 slope
        assert!((first[8].angle - 2.0 * 8.0 / 6.0).abs() < 1e-12);

        // Second phase has only frame 3 and is held there
        assert!(second.iter().all(|s| *s == TransformSample::splat(1.0)));

        let combined = PhaseStaggeredInterpolator::new().reconstruct(&sparse).unwrap();
        assert_eq!(combined.len(), 9);
    }

    #[test]
    fn test_phase_without_anchors_fails() {
        let sparse = sparse_from(3, &[TransformSample::IDENTITY]);

        let result = PhaseStaggeredInterpolator::new().reconstruct(&sparse);
        assert!(matches!(
            result,
            Err(StabilizeError::InsufficientSamples {
                phase: Phase::Second
            })
        ));
    }

    #[test]
    fn test_exact_at_period_boundary() {
        // len - last anchor == 1: no trailing remainder
        let samples: Vec<_> = (0..3).map(|k| TransformSample::splat(k as f64)).collect();
        let sparse = sparse_from(7, &samples);
        let first = fill_phase(&sparse.phase(Phase::First)).unwrap();
        assert_eq!(first[6], TransformSample::splat(2.0));
    }

    #[test]
    fn test_linear_motion_reconstructed() {
        let velocity = TransformSample::new(0.01, 0.5, -0.25);
        let len = 40;
        let samples: Vec<_> = (0..len)
            .step_by(3)
            .map(|i| velocity * i as f64)
            .collect();
        let sparse = sparse_from(len, &samples);

        let combined = PhaseStaggeredInterpolator::new().reconstruct(&sparse).unwrap();
        for (i, sample) in combined.iter().enumerate() {
            let expected = velocity * i as f64;
            assert!((sample.angle - expected.angle).abs() < 1e-9);
            assert!((sample.tx - expected.tx).abs() < 1e-9);
            assert!((sample.ty - expected.ty).abs() < 1e-9);
        }
    }

    #[test]
    fn test_source_arrays_unchanged() {
        let samples: Vec<_> = (0..5).map(|k| TransformSample::splat(k as f64)).collect();
        let sparse = sparse_from(15, &samples);
        let phase = sparse.phase(Phase::Second);
        let before = phase.clone();

        fill_phase(&phase).unwrap();
        assert_eq!(phase, before);
    }

    fn sample_strategy() -> impl Strategy<Value = TransformSample> {
        (-1.0f64..1.0, -50.0f64..50.0, -50.0f64..50.0)
            .prop_map(|(a, x, y)| TransformSample::new(a, x, y))
    }

    proptest! {
        #[test]
        fn prop_exact_at_anchors(
            len in 4usize..80,
            seed in prop::collection::vec(sample_strategy(), 27),
        ) {
            let samples = &seed[..len.div_ceil(3)];
            let sparse = sparse_from(len, samples);

            for phase in Phase::ALL {
                let array = sparse.phase(phase);
                let dense = fill_phase(&array).unwrap();
                prop_assert_eq!(dense.len(), len);
                for (i, sample) in array.anchors() {
                    prop_assert_eq!(dense[i], sample);
                    prop_assert_eq!(Some(sample), sparse.get(i));
                }
            }
        }

        #[test]
        fn prop_interior_within_anchor_bounds(
            len in 13usize..80,
            seed in prop::collection::vec(sample_strategy(), 27),
        ) {
            let samples = &seed[..len.div_ceil(3)];
            let sparse = sparse_from(len, samples);

            for phase in Phase::ALL {
                let array = sparse.phase(phase);
                let dense = fill_phase(&array).unwrap();
                let anchors: Vec<_> = array.anchors().collect();

                for pair in anchors.windows(2) {
                    let (i, a) = pair[0];
                    let (j, b) = pair[1];
                    for k in i + 1..j {
                        let v = dense[k].to_array();
                        for c in 0..TransformSample::COMPONENTS {
                            let lo = a.to_array()[c].min(b.to_array()[c]);
                            let hi = a.to_array()[c].max(b.to_array()[c]);
                            prop_assert!(v[c] >= lo - 1e-9 && v[c] <= hi + 1e-9);
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_combined_fully_dense(
            len in 4usize..80,
            seed in prop::collection::vec(sample_strategy(), 27),
        ) {
            let samples = &seed[..len.div_ceil(3)];
            let sparse = sparse_from(len, samples);
            let combined = PhaseStaggeredInterpolator::new().reconstruct(&sparse).unwrap();
            prop_assert_eq!(combined.len(), len);
            prop_assert!(combined.iter().all(TransformSample::is_finite));
        }
    }
}
