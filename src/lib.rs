//! Time-lapse Stabilization Library
//!
//! Removes involuntary rigid motion (rotation and translation) from a
//! time-lapse image stack. Registration is expensive and noisy, so only
//! every few frames are registered against a reference; the per-frame motion
//! is reconstructed from those samples, median filtered over time and then
//! undone frame by frame.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! stack → registration → trajectory → warp → stack
//!              ↓              ↓
//!        (sparse samples) (interpolate, smooth)
//! ```
//!
//! # Design Principles
//!
//! - **Full barriers**: each stage completes before the next starts
//! - **Fail whole**: any error aborts the run and nothing is written
//! - **Swappable engines**: registration and resampling sit behind traits
//! - **Owned stage outputs**: no stage mutates its input
//!
//! # Example
//!
//! ```no_run
//! use timelapse_stabilizer::{
//!     config::StabilizerConfig,
//!     pipeline::Stabilizer,
//!     stack::{output_path_for, read_tiff_stack, write_tiff_stack},
//! };
//! use std::path::Path;
//!
//! let input = Path::new("movie.tif");
//! let stack = read_tiff_stack(input).unwrap();
//!
//! let stabilizer = Stabilizer::from_config(StabilizerConfig::default()).unwrap();
//! let result = stabilizer.run(&stack).unwrap();
//!
//! write_tiff_stack(output_path_for(input), &result.output).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod registration;
pub mod stack;
pub mod trajectory;
pub mod warp;

// Re-export commonly used types at crate root
pub use config::StabilizerConfig;
pub use error::{Result, Stage, StabilizeError};
pub use pipeline::{Stabilization, StabilizationReport, Stabilizer};
pub use registration::{MomentRegistrar, Registrar, ScriptedRegistrar};
pub use stack::{Frame, FrameStack, PixelType};
pub use trajectory::{DenseTrajectory, SparseTrajectory, TransformSample};
pub use warp::{BilinearResampler, Resampler, RigidTransform};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
