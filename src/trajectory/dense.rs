//! Fully populated per-frame trajectories.

use std::ops::Index;

use super::sample::TransformSample;
use crate::error::{Result, StabilizeError};

/// One `TransformSample` for every frame of a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseTrajectory {
    samples: Vec<TransformSample>,
}

impl DenseTrajectory {
    /// Wraps per-frame samples.
    pub fn new(samples: Vec<TransformSample>) -> Self {
        Self { samples }
    }

    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the trajectory covers no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in frame order.
    #[inline]
    pub fn as_slice(&self) -> &[TransformSample] {
        &self.samples
    }

    /// Sample for frame `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<TransformSample> {
        self.samples.get(index).copied()
    }

    /// Iterates samples in frame order.
    pub fn iter(&self) -> impl Iterator<Item = &TransformSample> + '_ {
        self.samples.iter()
    }

    /// Consumes the trajectory.
    pub fn into_vec(self) -> Vec<TransformSample> {
        self.samples
    }

    /// Element-wise mean of two trajectories of equal length.
    pub fn average(a: &DenseTrajectory, b: &DenseTrajectory) -> Result<DenseTrajectory> {
        if a.len() != b.len() {
            return Err(StabilizeError::InvalidInput(format!(
                "cannot average trajectories of length {} and {}",
                a.len(),
                b.len()
            )));
        }

        let samples = a
            .samples
            .iter()
            .zip(&b.samples)
            .map(|(&x, &y)| (x + y) / 2.0)
            .collect();

        Ok(Self { samples })
    }

    /// Largest absolute rotation angle, 0 when empty.
    pub fn max_abs_angle(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.angle.abs())
            .fold(0.0, f64::max)
    }

    /// Largest translation magnitude, 0 when empty.
    pub fn max_translation(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.translation().length())
            .fold(0.0, f64::max)
    }
}

impl Index<usize> for DenseTrajectory {
    type Output = TransformSample;

    fn index(&self, index: usize) -> &TransformSample {
        &self.samples[index]
    }
}

impl From<Vec<TransformSample>> for DenseTrajectory {
    fn from(samples: Vec<TransformSample>) -> Self {
        Self::new(samples)
    }
}
