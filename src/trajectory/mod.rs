//! Motion trajectory reconstruction.
//!
//! Registration produces a [`SparseTrajectory`] with samples on every
//! `s`-th frame. The [`PhaseStaggeredInterpolator`] turns it into a dense
//! per-frame trajectory and the [`MedianSmoother`] suppresses the remaining
//! per-sample registration noise. Every stage returns a new trajectory and
//! leaves its input untouched.

mod dense;
mod interpolate;
mod sample;
mod smoothing;
mod sparse;

pub use dense::DenseTrajectory;
pub use interpolate::{fill_phase, PhaseStaggeredInterpolator};
pub use sample::{Slot, TransformSample};
pub use smoothing::{median_mut, MedianSmoother, DEFAULT_HALF_WIDTH};
pub use sparse::{Phase, PhaseArray, SparseTrajectory};
