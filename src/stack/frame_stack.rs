//! Ordered frame stacks with a shared geometry and pixel type.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frame::{Frame, Geometry};

/// Errors raised while building, reading or writing a stack.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("frame {index} is {got:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: Geometry,
        got: Geometry,
    },
    #[error("frame {index} pixel buffer does not match its dimensions")]
    InvalidFrame { index: usize },
    #[error("unsupported image in page {page}: {detail}")]
    UnsupportedFormat { page: usize, detail: String },
    #[error("failed to open {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },
}

impl StackError {
    /// True for errors raised while reading or validating input.
    pub fn is_read(&self) -> bool {
        !matches!(self, StackError::Write { .. } | StackError::Encode { .. })
    }
}

/// On-disk sample type of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// 8-bit unsigned.
    #[default]
    U8,
    /// 16-bit unsigned.
    U16,
    /// 32-bit float.
    F32,
}

impl PixelType {
    /// Converts a working sample back to this type's value range.
    ///
    /// Integer types round to nearest and saturate; floats pass through.
    pub fn quantize(self, value: f32) -> f32 {
        match self {
            PixelType::U8 => value.round().clamp(0.0, u8::MAX as f32),
            PixelType::U16 => value.round().clamp(0.0, u16::MAX as f32),
            PixelType::F32 => value,
        }
    }
}

/// Pixel density as TIFF rationals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Pixels per unit along x, as `[numerator, denominator]`.
    pub x: [u32; 2],
    /// Pixels per unit along y, as `[numerator, denominator]`.
    pub y: [u32; 2],
    /// TIFF `ResolutionUnit` code: 1 none, 2 inch, 3 centimeter.
    pub unit: u16,
}

/// Recording-level tags carried from the input stack to the output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackMetadata {
    /// Physical pixel spacing.
    pub resolution: Option<Resolution>,
    /// `ImageDescription` of the first page, e.g. an ImageJ hyperstack
    /// header.
    pub description: Option<String>,
}

impl StackMetadata {
    /// Metadata for a stack cut down from `source` to `frames` frames.
    ///
    /// ImageJ header entries (`images=`, `frames=`, `slices=`) that counted
    /// the source frames are updated; everything else is kept verbatim.
    pub fn with_frame_count(&self, source: usize, frames: usize) -> Self {
        let description = match &self.description {
            Some(text) if source != frames => Some(
                text.split('\n')
                    .map(|line| match line.split_once('=') {
                        Some((key @ ("images" | "frames" | "slices"), value))
                            if value.trim().parse::<usize>() == Ok(source) =>
                        {
                            format!("{key}={frames}")
                        }
                        _ => line.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            other => other.clone(),
        };

        Self {
            resolution: self.resolution,
            description,
        }
    }
}

/// Frames of one time-lapse recording.
///
/// All frames share one geometry. An empty stack is representable; the
/// pipeline rejects it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStack {
    frames: Vec<Frame>,
    geometry: Geometry,
    pixel_type: PixelType,
    metadata: StackMetadata,
}

impl FrameStack {
    /// Builds a stack, checking that every frame is well formed and shares
    /// the geometry of the first.
    pub fn new(frames: Vec<Frame>, pixel_type: PixelType) -> Result<Self, StackError> {
        let geometry = frames
            .first()
            .map(Frame::geometry)
            .unwrap_or(Geometry::new(0, 0));

        for (index, frame) in frames.iter().enumerate() {
            if !frame.is_valid() {
                return Err(StackError::InvalidFrame { index });
            }
            if frame.geometry() != geometry {
                return Err(StackError::ShapeMismatch {
                    index,
                    expected: geometry,
                    got: frame.geometry(),
                });
            }
        }

        Ok(Self {
            frames,
            geometry,
            pixel_type,
            metadata: StackMetadata::default(),
        })
    }

    /// Attaches recording-level metadata.
    pub fn with_metadata(mut self, metadata: StackMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the stack has no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in order.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Shared frame geometry.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Source pixel type.
    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Recording-level metadata.
    #[inline]
    pub fn metadata(&self) -> &StackMetadata {
        &self.metadata
    }

    /// Consumes the stack.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}
