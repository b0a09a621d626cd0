//! Frame warping.
//!
//! A [`RigidTransform`] per frame is built from the smoothed trajectory and
//! the shared center of rotation; a [`Resampler`] warps the frame into the
//! reference geometry.

mod apply;
mod resample;
mod transform;

pub use apply::TransformApplicator;
pub use resample::{BilinearResampler, Interpolation, ResampleError, Resampler};
pub use transform::RigidTransform;
