//! End-to-end stabilization of a frame stack.

use std::ops::Range;
use std::time::{Duration, Instant};

use tracing::info;

use super::context::StabilizationContext;
use crate::config::StabilizerConfig;
use crate::error::{Result, StabilizeError};
use crate::registration::{register_sampled, FrameSampler, MomentRegistrar, Registrar};
use crate::stack::{Frame, FrameStack};
use crate::trajectory::{
    DenseTrajectory, MedianSmoother, PhaseStaggeredInterpolator, SparseTrajectory,
};
use crate::warp::{BilinearResampler, Resampler, TransformApplicator};

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    /// Sampling and registration.
    pub registration: Duration,
    /// Phase split, interpolation and averaging.
    pub interpolation: Duration,
    /// Median filtering.
    pub smoothing: Duration,
    /// Warping and quantization.
    pub resampling: Duration,
}

impl StageTimings {
    /// Sum of all stages.
    pub fn total(&self) -> Duration {
        self.registration + self.interpolation + self.smoothing + self.resampling
    }
}

/// Motion estimate for a run, before any frame is warped.
#[derive(Debug, Clone)]
pub struct TrajectoryEstimate {
    /// Reference frame, center of rotation and processed range.
    pub context: StabilizationContext,
    /// Registered positions within the processed range.
    pub sampled: Vec<usize>,
    /// Registration results on the sampled positions.
    pub sparse: SparseTrajectory,
    /// Mean of the two densified phases.
    pub combined: DenseTrajectory,
    /// Median-filtered trajectory applied to the frames.
    pub smoothed: DenseTrajectory,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Stabilization {
    /// Warped frames in the source pixel type, carrying the source
    /// metadata.
    pub output: FrameStack,
    /// Motion estimate the output was warped with.
    pub estimate: TrajectoryEstimate,
    /// Per-stage wall-clock time.
    pub timings: StageTimings,
}

/// Runs sampling, registration, trajectory reconstruction, smoothing and
/// warping over a stack.
///
/// Stages run strictly one after another; registration and warping fan out
/// over the rayon pool within their stage.
pub struct Stabilizer<R = MomentRegistrar, S = BilinearResampler> {
    config: StabilizerConfig,
    registrar: R,
    resampler: S,
}

impl Stabilizer {
    /// Builds a stabilizer with the built-in registrar and resampler.
    pub fn from_config(config: StabilizerConfig) -> Result<Self> {
        let registrar = MomentRegistrar::new(&config.registration);
        Self::new(config, registrar, BilinearResampler::new())
    }
}

impl<R: Registrar, S: Resampler> Stabilizer<R, S> {
    /// Creates a stabilizer; fails if `config` does not validate.
    pub fn new(config: StabilizerConfig, registrar: R, resampler: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registrar,
            resampler,
        })
    }

    /// Validated configuration.
    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Registration engine in use.
    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    /// Estimates and smooths the per-frame motion without warping.
    pub fn estimate(&self, stack: &FrameStack) -> Result<TrajectoryEstimate> {
        self.estimate_timed(stack, &mut StageTimings::default())
    }

    /// Stabilizes the configured range of `stack`.
    pub fn run(&self, stack: &FrameStack) -> Result<Stabilization> {
        let mut timings = StageTimings::default();
        let estimate = self.estimate_timed(stack, &mut timings)?;
        let context = &estimate.context;
        let frames = &stack.frames()[context.range()];

        let started = Instant::now();
        let applicator = TransformApplicator::new(
            &self.resampler,
            self.config.resample.interpolation,
            self.config.resample.background,
        );
        let warped = applicator.apply(
            frames,
            &estimate.smoothed,
            context.center(),
            context.geometry(),
        )?;
        timings.resampling = started.elapsed();

        let pixel_type = stack.pixel_type();
        let warped = warped
            .into_iter()
            .map(|frame| {
                let pixels = frame
                    .pixels()
                    .iter()
                    .map(|&v| pixel_type.quantize(v))
                    .collect();
                Frame::new(pixels, frame.width(), frame.height(), frame.index())
            })
            .collect();
        let metadata = stack
            .metadata()
            .with_frame_count(stack.len(), context.len());
        let output = FrameStack::new(warped, pixel_type)?.with_metadata(metadata);

        info!(
            frames = output.len(),
            total_ms = timings.total().as_millis() as u64,
            "Stabilization complete"
        );

        Ok(Stabilization {
            output,
            estimate,
            timings,
        })
    }

    fn resolve_range(&self, len: usize) -> Result<Range<usize>> {
        let start = self.config.range.start_frame.unwrap_or(0);
        let end = self.config.range.end_frame.unwrap_or(len);
        if end > len {
            return Err(StabilizeError::InvalidInput(format!(
                "frame range {start}..{end} exceeds stack of {len} frames"
            )));
        }
        if start >= end {
            return Err(StabilizeError::InvalidInput(format!(
                "frame range {start}..{end} is empty"
            )));
        }
        Ok(start..end)
    }

    fn estimate_timed(
        &self,
        stack: &FrameStack,
        timings: &mut StageTimings,
    ) -> Result<TrajectoryEstimate> {
        if stack.is_empty() {
            return Err(StabilizeError::InvalidInput(
                "frame stack is empty".into(),
            ));
        }

        let range = self.resolve_range(stack.len())?;
        let frames = &stack.frames()[range.clone()];
        let n = frames.len();
        let stride = self.config.sampling.rate;
        let reference = &frames[n / 2];

        info!(
            start = range.start,
            end = range.end,
            reference = reference.index(),
            stride,
            "Estimating motion"
        );

        let started = Instant::now();
        let sampled = FrameSampler::new(stride)?.indices(n)?;
        let registered = register_sampled(&self.registrar, frames, reference, &sampled)?;
        timings.registration = started.elapsed();

        let started = Instant::now();
        let sparse = SparseTrajectory::from_samples(n, stride, &registered.samples)?;
        let combined = PhaseStaggeredInterpolator::new().reconstruct(&sparse)?;
        timings.interpolation = started.elapsed();

        let started = Instant::now();
        let smoothed = MedianSmoother::new(self.config.smoothing.width).smooth(&combined);
        timings.smoothing = started.elapsed();

        let context = StabilizationContext::new(range, registered.center, reference.geometry());

        Ok(TrajectoryEstimate {
            context,
            sampled,
            sparse,
            combined,
            smoothed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::ScriptedRegistrar;
    use crate::stack::{PixelType, Resolution, StackMetadata};
    use crate::trajectory::TransformSample;
    use glam::DVec2;

    fn flat_stack(n: usize) -> FrameStack {
        let frames = (0..n)
            .map(|i| Frame::new(vec![10.0; 16], 4, 4, i))
            .collect();
        FrameStack::new(frames, PixelType::U8).unwrap()
    }

    fn zero_motion(indices: impl IntoIterator<Item = usize>) -> ScriptedRegistrar {
        ScriptedRegistrar::new(DVec2::new(1.5, 1.5))
            .with_fn(indices, |_| TransformSample::IDENTITY)
    }

    #[test]
    fn test_empty_stack_rejected_before_registration() {
        let stabilizer = Stabilizer::new(
            StabilizerConfig::default(),
            zero_motion([]),
            BilinearResampler::new(),
        )
        .unwrap();

        let result = stabilizer.run(&flat_stack(0));
        assert!(matches!(result, Err(StabilizeError::InvalidInput(_))));
        assert_eq!(stabilizer.registrar().calls(), 0);
    }

    #[test]
    fn test_twelve_frame_estimate() {
        let registrar = ScriptedRegistrar::new(DVec2::new(1.5, 1.5))
            .with_fn([0, 3, 6, 9], |i| TransformSample::splat((i / 3) as f64));
        let stabilizer =
            Stabilizer::new(StabilizerConfig::default(), registrar, BilinearResampler::new())
                .unwrap();

        let estimate = stabilizer.estimate(&flat_stack(12)).unwrap();

        assert_eq!(estimate.sampled, vec![0, 3, 6, 9]);
        assert_eq!(estimate.combined.len(), 12);
        assert_eq!(estimate.combined[0], TransformSample::splat(0.0));
        assert_eq!(estimate.combined[6], TransformSample::splat(2.0));
        assert_eq!(estimate.context.reference(), 6);
        assert_eq!(estimate.context.center(), DVec2::new(1.5, 1.5));
        // Boundary frames pass through the smoother
        assert_eq!(estimate.smoothed.as_slice()[..5], estimate.combined.as_slice()[..5]);
        assert_eq!(stabilizer.registrar().calls(), 4);
    }

    #[test]
    fn test_zero_motion_reproduces_stack() {
        let stack = flat_stack(9).with_metadata(StackMetadata {
            resolution: Some(Resolution {
                x: [5000, 1],
                y: [5000, 1],
                unit: 3,
            }),
            description: Some("ImageJ=1.53t\nimages=9\n".into()),
        });
        let stabilizer = Stabilizer::new(
            StabilizerConfig::default(),
            zero_motion([0, 3, 6]),
            BilinearResampler::new(),
        )
        .unwrap();

        let result = stabilizer.run(&stack).unwrap();
        assert_eq!(result.output, stack);
        assert!(result.timings.total() >= result.timings.resampling);
    }

    #[test]
    fn test_sub_range_processed_alone() {
        let mut config = StabilizerConfig::default();
        config.range.start_frame = Some(4);
        config.range.end_frame = Some(13);
        let stabilizer =
            Stabilizer::new(config, zero_motion([4, 7, 10]), BilinearResampler::new()).unwrap();

        let stack = flat_stack(20).with_metadata(StackMetadata {
            resolution: None,
            description: Some("ImageJ=1.53t\nimages=20\nframes=20\n".into()),
        });

        let result = stabilizer.run(&stack).unwrap();
        assert_eq!(result.output.len(), 9);
        assert_eq!(
            result.output.metadata().description.as_deref(),
            Some("ImageJ=1.53t\nimages=9\nframes=9\n")
        );
        assert_eq!(result.output.frames()[0].index(), 4);
        assert_eq!(result.estimate.context.reference_stack_index(), 8);
        assert_eq!(stabilizer.registrar().calls(), 3);
    }

    #[test]
    fn test_range_past_end_rejected() {
        let mut config = StabilizerConfig::default();
        config.range.end_frame = Some(30);
        let stabilizer =
            Stabilizer::new(config, zero_motion(0..30), BilinearResampler::new()).unwrap();

        let result = stabilizer.estimate(&flat_stack(20));
        assert!(matches!(result, Err(StabilizeError::InvalidInput(_))));
        assert_eq!(stabilizer.registrar().calls(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = StabilizerConfig::default();
        config.sampling.rate = 0;
        let result = Stabilizer::new(config, zero_motion([]), BilinearResampler::new());
        assert!(matches!(result, Err(StabilizeError::Config(_))));
    }

    #[test]
    fn test_three_frames_lack_second_phase() {
        let stabilizer = Stabilizer::new(
            StabilizerConfig::default(),
            zero_motion([0]),
            BilinearResampler::new(),
        )
        .unwrap();

        let result = stabilizer.estimate(&flat_stack(3));
        assert!(matches!(
            result,
            Err(StabilizeError::InsufficientSamples { .. })
        ));
    }
}
