//! Sparse trajectories built from registration results and their
//! phase-split views.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sample::{Slot, TransformSample};
use crate::error::{Result, StabilizeError};

/// One of the two interleaved sub-sequences of sampled frames.
///
/// With sampling stride `s` the registration period of a phase is `2s`; the
/// second phase is shifted by half a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Samples at `i % 2s == 0`.
    First,
    /// Samples at `i % 2s == s`.
    Second,
}

impl Phase {
    /// Both phases, in order.
    pub const ALL: [Phase; 2] = [Phase::First, Phase::Second];

    /// Index of the first slot owned by this phase.
    #[inline]
    pub fn offset(self, stride: usize) -> usize {
        match self {
            Phase::First => 0,
            Phase::Second => stride,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::First => f.write_str("first"),
            Phase::Second => f.write_str("second"),
        }
    }
}

/// Registration results laid out over every frame of a run.
///
/// Known slots sit exactly on the multiples of the sampling stride; all
/// other slots are `Unknown`. The trajectory is read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTrajectory {
    slots: Vec<Slot>,
    stride: usize,
}

impl SparseTrajectory {
    /// Places `samples[k]` at frame `k * stride` of a `len`-frame run.
    ///
    /// Fails unless there is exactly one sample per multiple of `stride`
    /// below `len`.
    pub fn from_samples(len: usize, stride: usize, samples: &[TransformSample]) -> Result<Self> {
        if len == 0 {
            return Err(StabilizeError::InvalidInput(
                "trajectory must cover at least one frame".into(),
            ));
        }
        if stride == 0 {
            return Err(StabilizeError::InvalidInput(
                "sampling stride must be positive".into(),
            ));
        }

        let expected = len.div_ceil(stride);
        if samples.len() != expected {
            return Err(StabilizeError::InvalidInput(format!(
                "expected {expected} registered samples for {len} frames at stride {stride}, got {}",
                samples.len()
            )));
        }

        let mut slots = vec![Slot::Unknown; len];
        for (k, sample) in samples.iter().enumerate() {
            slots[k * stride] = Slot::Known(*sample);
        }

        Ok(Self { slots, stride })
    }

    /// Number of frames covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; construction rejects empty runs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sampling stride.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Spacing between known slots of one phase.
    #[inline]
    pub fn period(&self) -> usize {
        2 * self.stride
    }

    /// All slots in frame order.
    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Sample registered for `index`, if any.
    pub fn get(&self, index: usize) -> Option<TransformSample> {
        self.slots.get(index).and_then(Slot::known)
    }

    /// Copies out the slots owned by `phase`; everything else is `Unknown`.
    pub fn phase(&self, phase: Phase) -> PhaseArray {
        let start = phase.offset(self.stride);
        let period = self.period();

        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                if i >= start && (i - start) % period == 0 {
                    *slot
                } else {
                    Slot::Unknown
                }
            })
            .collect();

        PhaseArray {
            phase,
            start,
            period,
            slots,
        }
    }

    /// Splits into the two phase arrays.
    pub fn split(&self) -> (PhaseArray, PhaseArray) {
        (self.phase(Phase::First), self.phase(Phase::Second))
    }
}

/// Known samples of a single phase, spaced one period apart.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseArray {
    phase: Phase,
    start: usize,
    period: usize,
    slots: Vec<Slot>,
}

impl PhaseArray {
    /// Which phase this array holds.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Position of the first anchor.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Spacing between anchors.
    #[inline]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of frames covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the array covers no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots in frame order.
    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Known positions with their samples, in frame order.
    pub fn anchors(&self) -> impl Iterator<Item = (usize, TransformSample)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.known().map(|sample| (i, sample)))
    }
}
