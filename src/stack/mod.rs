//! Image stacks and their on-disk form.
//!
//! A time-lapse is held as a [`FrameStack`] of [`Frame`]s sharing one
//! geometry. Samples are `f32` in memory; the stack remembers the source
//! [`PixelType`] and [`StackMetadata`] so output is written back in the
//! same type with the same resolution and description tags.

mod frame;
mod frame_stack;
mod io;

pub use frame::{Frame, Geometry};
pub use frame_stack::{FrameStack, PixelType, Resolution, StackError, StackMetadata};
pub use io::{output_path_for, read_tiff_stack, write_tiff_stack, OUTPUT_SUFFIX};
