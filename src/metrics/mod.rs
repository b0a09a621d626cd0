//! Prometheus metrics for stabilization runs.
//!
//! The registry is filled from a finished run and rendered in the
//! Prometheus text exposition format, for example to a node-exporter
//! textfile collector directory.
//!
//! # Metrics Exposed
//!
//! ## Volume
//! - `timelapse_stabilizer_frames_total` - Frames processed
//! - `timelapse_stabilizer_sampled_frames_total` - Frames registered
//! - `timelapse_stabilizer_resampled_frames_total` - Frames warped
//!
//! ## Motion
//! - `timelapse_stabilizer_max_abs_angle_radians` - Largest smoothed rotation
//! - `timelapse_stabilizer_max_translation_pixels` - Largest smoothed shift
//! - `timelapse_stabilizer_center_{x,y}_pixels` - Center of rotation
//!
//! ## Timing
//! - `timelapse_stabilizer_stage_seconds{stage}` - Seconds per stage
//! - `timelapse_stabilizer_runs` - Runs recorded
//!
//! # Example
//!
//! ```no_run
//! use timelapse_stabilizer::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     frames: 120,
//!     sampled_frames: 40,
//!     resampled_frames: 120,
//!     max_abs_angle: 0.02,
//!     max_translation: 4.5,
//!     center: [255.5, 255.5],
//!     stage_seconds: vec![("registration", 3.2), ("resampling", 1.1)],
//! };
//!
//! registry.update(&snapshot);
//! print!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
