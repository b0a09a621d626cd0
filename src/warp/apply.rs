//! Applying a smoothed trajectory to every frame of a run.

use glam::DVec2;
use rayon::prelude::*;
use tracing::{debug, info};

use super::resample::{Interpolation, Resampler};
use super::transform::RigidTransform;
use crate::error::{Result, StabilizeError};
use crate::stack::{Frame, Geometry};
use crate::trajectory::DenseTrajectory;

/// Warps each frame by its trajectory entry about a shared center.
pub struct TransformApplicator<'a, S: Resampler + ?Sized> {
    resampler: &'a S,
    interpolation: Interpolation,
    background: f32,
}

impl<'a, S: Resampler + ?Sized> TransformApplicator<'a, S> {
    /// Creates an applicator over `resampler`.
    pub fn new(resampler: &'a S, interpolation: Interpolation, background: f32) -> Self {
        Self {
            resampler,
            interpolation,
            background,
        }
    }

    /// Resamples `frames[i]` by `trajectory[i]` into `geometry`.
    ///
    /// Frames are processed in parallel; the output keeps input order. The
    /// first failing frame aborts the whole stage.
    pub fn apply(
        &self,
        frames: &[Frame],
        trajectory: &DenseTrajectory,
        center: DVec2,
        geometry: Geometry,
    ) -> Result<Vec<Frame>> {
        if frames.len() != trajectory.len() {
            return Err(StabilizeError::InvalidInput(format!(
                "{} frames but {} trajectory entries",
                frames.len(),
                trajectory.len()
            )));
        }

        info!(
            frames = frames.len(),
            center_x = center.x,
            center_y = center.y,
            "Applying transforms"
        );

        let warped = frames
            .par_iter()
            .zip(trajectory.as_slice().par_iter())
            .map(|(frame, sample)| {
                let transform = RigidTransform::from_sample(sample, center);
                debug!(
                    frame = frame.index(),
                    angle = sample.angle,
                    tx = sample.tx,
                    ty = sample.ty,
                    "Resampling frame"
                );
                self.resampler
                    .resample(
                        frame,
                        geometry,
                        &transform,
                        self.interpolation,
                        self.background,
                    )
                    .map_err(|source| StabilizeError::Resampling {
                        index: frame.index(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(warped)
    }
}
