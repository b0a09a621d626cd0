//! Stage orchestration.
//!
//! ```text
//! FrameStack ─▶ sampler ─▶ registrar ─▶ SparseTrajectory
//!                                             │
//!                      PhaseStaggeredInterpolator
//!                                             ▼
//!            MedianSmoother ◀─ combined DenseTrajectory
//!                  │
//!                  ▼
//!        TransformApplicator ─▶ stabilized FrameStack
//! ```
//!
//! Each arrow is a full barrier: a stage starts only once the previous one
//! has produced its whole result, and the first error aborts the run.

mod context;
mod report;
mod stabilizer;

pub use context::StabilizationContext;
pub use report::{FrameTransform, ReportError, RunParameters, StabilizationReport};
pub use stabilizer::{Stabilization, Stabilizer, StageTimings, TrajectoryEstimate};
