//! Per-run immutable state shared by the later stages.

use std::ops::Range;

use glam::DVec2;

use crate::stack::Geometry;

/// Reference frame and center of rotation for one stabilization run.
///
/// Built once registration has finished and read-only afterwards. Positions
/// are relative to the processed range; `range` maps them back onto the
/// input stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizationContext {
    range: Range<usize>,
    reference: usize,
    center: DVec2,
    geometry: Geometry,
}

impl StabilizationContext {
    pub(crate) fn new(range: Range<usize>, center: DVec2, geometry: Geometry) -> Self {
        let reference = range.len() / 2;
        Self {
            range,
            reference,
            center,
            geometry,
        }
    }

    /// Frames of the input stack that were processed.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Number of processed frames.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// True if no frames were processed.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Position of the reference frame within the processed range.
    pub fn reference(&self) -> usize {
        self.reference
    }

    /// Index of the reference frame in the input stack.
    pub fn reference_stack_index(&self) -> usize {
        self.range.start + self.reference
    }

    /// Center of rotation shared by every frame.
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Output geometry (the reference frame's).
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_middle_of_range() {
        let ctx = StabilizationContext::new(10..21, DVec2::ZERO, Geometry::new(4, 4));
        assert_eq!(ctx.len(), 11);
        assert_eq!(ctx.reference(), 5);
        assert_eq!(ctx.reference_stack_index(), 15);

        let ctx = StabilizationContext::new(0..12, DVec2::ZERO, Geometry::new(4, 4));
        assert_eq!(ctx.reference(), 6);
    }
}
