//! Machine-readable summary of a finished run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stabilizer::Stabilization;
use crate::config::StabilizerConfig;

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Smoothed transform applied to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTransform {
    /// Index in the input stack.
    pub frame: usize,
    /// Rotation in radians.
    pub angle: f64,
    /// Translation along x in pixels.
    pub tx: f64,
    /// Translation along y in pixels.
    pub ty: f64,
}

/// Effective parameters of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// Registration stride.
    pub sampling_rate: usize,
    /// Median filter half-width.
    pub smoothing_width: usize,
    /// First processed stack index.
    pub start_frame: usize,
    /// One past the last processed stack index.
    pub end_frame: usize,
    /// Stack index of the reference frame.
    pub reference_frame: usize,
    /// Whether rotation was estimated.
    pub estimate_rotation: bool,
}

/// Run report, written as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizationReport {
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Crate version that produced the run.
    pub version: String,
    /// Input stack path.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub input: Option<PathBuf>,
    /// Output stack path.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output: Option<PathBuf>,
    /// Center of rotation `[x, y]` in pixels.
    pub center_of_rotation: [f64; 2],
    /// Stack indices that were registered.
    pub sampled_frames: Vec<usize>,
    /// Total time across all stages.
    pub elapsed_seconds: f64,
    /// Effective run parameters.
    pub parameters: RunParameters,
    /// Smoothed transform per processed frame.
    pub trajectory: Vec<FrameTransform>,
}

impl StabilizationReport {
    /// Summarises `run` as produced with `config`.
    pub fn from_run(run: &Stabilization, config: &StabilizerConfig) -> Self {
        let context = &run.estimate.context;
        let range = context.range();

        let trajectory = run
            .estimate
            .smoothed
            .iter()
            .enumerate()
            .map(|(i, s)| FrameTransform {
                frame: range.start + i,
                angle: s.angle,
                tx: s.tx,
                ty: s.ty,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            version: crate::VERSION.to_string(),
            input: None,
            output: None,
            center_of_rotation: context.center().to_array(),
            sampled_frames: run
                .estimate
                .sampled
                .iter()
                .map(|&i| range.start + i)
                .collect(),
            elapsed_seconds: run.timings.total().as_secs_f64(),
            parameters: RunParameters {
                sampling_rate: config.sampling.rate,
                smoothing_width: config.smoothing.width,
                start_frame: range.start,
                end_frame: range.end,
                reference_frame: context.reference_stack_index(),
                estimate_rotation: config.registration.estimate_rotation,
            },
            trajectory,
        }
    }

    /// Records the stack paths.
    pub fn with_paths(mut self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self.output = Some(output.into());
        self
    }

    /// Renders the report as TOML.
    pub fn to_toml_string(&self) -> Result<String, ReportError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
