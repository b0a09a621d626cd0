//! Selection of frames to register.

use crate::error::{Result, StabilizeError};

/// Default registration stride.
pub const DEFAULT_STRIDE: usize = 3;

/// Picks every `stride`-th frame for registration.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    stride: usize,
}

impl FrameSampler {
    /// Creates a sampler; the stride must be positive.
    pub fn new(stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(StabilizeError::InvalidInput(
                "sampling stride must be positive".into(),
            ));
        }
        Ok(Self { stride })
    }

    /// Sampling stride.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Indices `0, s, 2s, ...` below `frames`.
    ///
    /// Fails for an empty run; a run shorter than the stride yields `[0]`.
    pub fn indices(&self, frames: usize) -> Result<Vec<usize>> {
        if frames == 0 {
            return Err(StabilizeError::InvalidInput(
                "frame stack is empty".into(),
            ));
        }
        Ok((0..frames).step_by(self.stride).collect())
    }
}

/// Indices `0, stride, 2 * stride, ...` below `frames`.
pub fn sample_indices(frames: usize, stride: usize) -> Result<Vec<usize>> {
    FrameSampler::new(stride)?.indices(frames)
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            stride: DEFAULT_STRIDE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_three() {
        let sampler = FrameSampler::default();
        assert_eq!(sampler.indices(12).unwrap(), vec![0, 3, 6, 9]);
        assert_eq!(sampler.indices(10).unwrap(), vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_short_run_yields_first_frame() {
        let sampler = FrameSampler::new(3).unwrap();
        assert_eq!(sampler.indices(2).unwrap(), vec![0]);
    }

    #[test]
    fn test_empty_run_rejected() {
        assert!(matches!(
            FrameSampler::default().indices(0),
            Err(StabilizeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(FrameSampler::new(0).is_err());
        assert!(sample_indices(12, 0).is_err());
    }

    #[test]
    fn test_sample_indices_other_stride() {
        assert_eq!(sample_indices(9, 2).unwrap(), vec![0, 2, 4, 6, 8]);
    }
}
