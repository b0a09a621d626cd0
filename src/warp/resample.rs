//! Warping a frame into a reference geometry.
//!
//! Resampling is backward-mapped: every output pixel `p` reads the source
//! frame at `T(p)`. Points whose continuous index falls outside
//! `[-0.5, size - 0.5)` on either axis receive the background value; inside
//! that band, neighbours beyond the last row or column are clamped to it.

use glam::DVec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transform::RigidTransform;
use crate::stack::{Frame, Geometry};

/// Errors that can occur while resampling a frame.
#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("output geometry {width}x{height} has no pixels")]
    EmptyGeometry { width: usize, height: usize },
    #[error("source frame pixel buffer does not match its dimensions")]
    InvalidFrame,
    #[error("resampler failed: {0}")]
    Backend(String),
}

/// Sampling kernel used between source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Bilinear interpolation of the four nearest pixels.
    #[default]
    Linear,
    /// Nearest pixel.
    Nearest,
}

/// Warps frames by known rigid transforms.
///
/// Implementations must be callable from several threads at once.
pub trait Resampler: Sync {
    /// Produces a `geometry`-sized frame whose pixel `p` is `frame` sampled at
    /// `transform.to_affine()` of `p`, using `background` outside the source
    /// extent.
    fn resample(
        &self,
        frame: &Frame,
        geometry: Geometry,
        transform: &RigidTransform,
        interpolation: Interpolation,
        background: f32,
    ) -> Result<Frame, ResampleError>;
}

/// CPU resampler; rows are processed in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearResampler;

impl BilinearResampler {
    /// Creates the resampler.
    pub fn new() -> Self {
        Self
    }
}

impl Resampler for BilinearResampler {
    fn resample(
        &self,
        frame: &Frame,
        geometry: Geometry,
        transform: &RigidTransform,
        interpolation: Interpolation,
        background: f32,
    ) -> Result<Frame, ResampleError> {
        if geometry.is_empty() {
            return Err(ResampleError::EmptyGeometry {
                width: geometry.width,
                height: geometry.height,
            });
        }
        if !frame.is_valid() {
            return Err(ResampleError::InvalidFrame);
        }

        let affine = transform.to_affine();
        let mut pixels = vec![background; geometry.area()];

        pixels
            .par_chunks_mut(geometry.width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let src = affine.transform_point2(DVec2::new(x as f64, y as f64));
                    *out = match interpolation {
                        Interpolation::Linear => linear_sample(frame, src, background),
                        Interpolation::Nearest => nearest_sample(frame, src, background),
                    };
                }
            });

        Ok(Frame::new(
            pixels,
            geometry.width,
            geometry.height,
            frame.index(),
        ))
    }
}

#[inline]
fn inside(frame: &Frame, p: DVec2) -> bool {
    p.x >= -0.5
        && p.y >= -0.5
        && p.x < frame.width() as f64 - 0.5
        && p.y < frame.height() as f64 - 0.5
}

/// Bilinear sample at a continuous position.
#[inline]
fn linear_sample(frame: &Frame, p: DVec2, background: f32) -> f32 {
    if !inside(frame, p) {
        return background;
    }

    let max_x = frame.width() as i64 - 1;
    let max_y = frame.height() as i64 - 1;

    let x0f = p.x.floor();
    let y0f = p.y.floor();
    let fx = (p.x - x0f) as f32;
    let fy = (p.y - y0f) as f32;

    let x0 = (x0f as i64).clamp(0, max_x) as usize;
    let y0 = (y0f as i64).clamp(0, max_y) as usize;
    let x1 = (x0f as i64 + 1).clamp(0, max_x) as usize;
    let y1 = (y0f as i64 + 1).clamp(0, max_y) as usize;

    let p00 = frame.get(x0, y0);
    let p10 = frame.get(x1, y0);
    let p01 = frame.get(x0, y1);
    let p11 = frame.get(x1, y1);

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    top + fy * (bottom - top)
}

#[inline]
fn nearest_sample(frame: &Frame, p: DVec2, background: f32) -> f32 {
    if !inside(frame, p) {
        return background;
    }
    let x = (p.x.round() as i64).clamp(0, frame.width() as i64 - 1);
    let y = (p.y.round() as i64).clamp(0, frame.height() as i64 - 1);
    frame.get(x as usize, y as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_frame(width: usize, height: usize) -> Frame {
        let pixels = (0..width * height)
            .map(|i| ((i % width) * 3 + (i / width) * 7) as f32 + 0.25)
            .collect();
        Frame::new(pixels, width, height, 4)
    }

    #[test]
    fn test_identity_reproduces_frame() {
        let frame = ramp_frame(17, 11);
        let transform = RigidTransform::identity(DVec2::new(8.0, 5.0));

        for interpolation in [Interpolation::Linear, Interpolation::Nearest] {
            let out = BilinearResampler
                .resample(&frame, frame.geometry(), &transform, interpolation, 0.0)
                .unwrap();
            assert_eq!(out, frame);
        }
    }

    #[test]
    fn test_integer_shift_moves_content() {
        let frame = ramp_frame(8, 6);
        let transform = RigidTransform {
            angle: 0.0,
            translation: DVec2::new(2.0, 1.0),
            center: DVec2::ZERO,
        };

        let out = BilinearResampler
            .resample(&frame, frame.geometry(), &transform, Interpolation::Linear, -1.0)
            .unwrap();

        assert_eq!(out.get(0, 0), frame.get(2, 1));
        assert_eq!(out.get(5, 4), frame.get(7, 5));
        // Reads past the right and bottom edges hit the background
        assert_eq!(out.get(6, 0), -1.0);
        assert_eq!(out.get(0, 5), -1.0);
    }

    #[test]
    fn test_half_pixel_shift_interpolates() {
        let frame = ramp_frame(8, 6);
        let transform = RigidTransform {
            angle: 0.0,
            translation: DVec2::new(0.5, 0.0),
            center: DVec2::ZERO,
        };

        let out = BilinearResampler
            .resample(&frame, frame.geometry(), &transform, Interpolation::Linear, 0.0)
            .unwrap();
        let expected = (frame.get(2, 3) + frame.get(3, 3)) / 2.0;
        assert_relative_eq!(out.get(2, 3), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_output_shape_and_index_preserved() {
        let frame = ramp_frame(9, 5);
        let transform = RigidTransform {
            angle: 0.3,
            translation: DVec2::new(-1.5, 2.25),
            center: DVec2::new(4.0, 2.0),
        };

        let out = BilinearResampler
            .resample(&frame, frame.geometry(), &transform, Interpolation::Linear, 0.0)
            .unwrap();
        assert_eq!(out.geometry(), frame.geometry());
        assert_eq!(out.index(), 4);
        assert!(out.is_valid());
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let frame = ramp_frame(4, 4);
        let result = BilinearResampler.resample(
            &frame,
            Geometry::new(0, 4),
            &RigidTransform::identity(DVec2::ZERO),
            Interpolation::Linear,
            0.0,
        );
        assert!(matches!(result, Err(ResampleError::EmptyGeometry { .. })));
    }
}
