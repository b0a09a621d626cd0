//! Sliding-window median filtering of dense trajectories.

use tracing::{debug, warn};

use super::dense::DenseTrajectory;
use super::sample::TransformSample;

/// Default half-window radius.
pub const DEFAULT_HALF_WIDTH: usize = 5;

/// Median of `values`, reordering the slice in place.
///
/// Even-length input yields the mean of the two middle values. Returns NaN
/// for empty input.
pub fn median_mut(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }

    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;

    if n % 2 == 1 {
        upper
    } else {
        let lower_max = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lower_max + upper) / 2.0
    }
}

/// Per-parameter running median over a window of `2 * half_width + 1`
/// frames.
///
/// Frames closer than `half_width` to either end are copied through
/// unchanged; the window is never shrunk at the boundary.
#[derive(Debug, Clone, Copy)]
pub struct MedianSmoother {
    half_width: usize,
}

impl MedianSmoother {
    /// Creates a smoother with the given half-window radius.
    pub fn new(half_width: usize) -> Self {
        Self { half_width }
    }

    /// Half-window radius.
    #[inline]
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Full window length.
    #[inline]
    pub fn window(&self) -> usize {
        2 * self.half_width + 1
    }

    /// Returns a smoothed copy of `trajectory`.
    pub fn smooth(&self, trajectory: &DenseTrajectory) -> DenseTrajectory {
        let w = self.half_width;
        let n = trajectory.len();
        let source = trajectory.as_slice();
        let mut out = source.to_vec();

        if n < self.window() {
            warn!(
                frames = n,
                window = self.window(),
                "Trajectory shorter than smoothing window, left unsmoothed"
            );
            return DenseTrajectory::new(out);
        }

        let mut scratch: [Vec<f64>; TransformSample::COMPONENTS] =
            std::array::from_fn(|_| Vec::with_capacity(self.window()));

        for i in w..n - w {
            for column in scratch.iter_mut() {
                column.clear();
            }
            for sample in &source[i - w..=i + w] {
                for (column, value) in scratch.iter_mut().zip(sample.to_array()) {
                    column.push(value);
                }
            }

            out[i] = TransformSample::from_array(scratch.each_mut().map(|c| median_mut(c)));
        }

        debug!(
            frames = n,
            smoothed = n - 2 * w,
            window = self.window(),
            "Median smoothing done"
        );

        DenseTrajectory::new(out)
    }
}

impl Default for MedianSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_WIDTH)
    }
}
