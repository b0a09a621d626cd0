//! Pipeline-level error type.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::ReportError;
use crate::registration::RegistrationError;
use crate::stack::StackError;
use crate::trajectory::Phase;
use crate::warp::ResampleError;

/// Pipeline stage in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the stack or validating parameters.
    Input,
    /// Registering sampled frames.
    Registration,
    /// Reconstructing the dense trajectory.
    Interpolation,
    /// Warping frames.
    Resampling,
    /// Writing results.
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Registration => "registration",
            Stage::Interpolation => "interpolation",
            Stage::Resampling => "resampling",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

/// Errors that abort a stabilization run.
///
/// Every variant is fatal: no output is written once one is raised.
#[derive(Debug, Error)]
pub enum StabilizeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient samples: {phase} phase has no registered frames")]
    InsufficientSamples { phase: Phase },
    #[error("registration failed for frame {index}")]
    RegistrationFailure {
        index: usize,
        #[source]
        source: RegistrationError,
    },
    #[error("resampling failed for frame {index}")]
    Resampling {
        index: usize,
        #[source]
        source: ResampleError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl StabilizeError {
    /// Stage that raised the error.
    pub fn stage(&self) -> Stage {
        match self {
            StabilizeError::InvalidInput(_) | StabilizeError::Config(_) => Stage::Input,
            StabilizeError::InsufficientSamples { .. } => Stage::Interpolation,
            StabilizeError::RegistrationFailure { .. } => Stage::Registration,
            StabilizeError::Resampling { .. } => Stage::Resampling,
            StabilizeError::Stack(e) if e.is_read() => Stage::Input,
            StabilizeError::Stack(_) | StabilizeError::Report(_) => Stage::Output,
        }
    }

    /// Frame the error refers to, if it is tied to one.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            StabilizeError::RegistrationFailure { index, .. }
            | StabilizeError::Resampling { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T, E = StabilizeError> = std::result::Result<T, E>;
