//! Frame type representing one slice of an image stack.

/// Width and height of a frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Geometry {
    /// Creates a geometry.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Returns true if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

/// A single grayscale slice of a time-lapse stack.
///
/// Samples are kept as `f32` regardless of the on-disk pixel type; the
/// owning stack remembers the type for writing. Frames are immutable once
/// read.
#[derive(Clone, PartialEq)]
pub struct Frame {
    /// Row-major samples.
    pixels: Vec<f32>,
    /// Frame width in pixels.
    width: usize,
    /// Frame height in pixels.
    height: usize,
    /// Position in the source stack.
    index: usize,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<f32>, width: usize, height: usize, index: usize) -> Self {
        Self {
            pixels,
            width,
            height,
            index,
        }
    }

    /// Returns a reference to the samples.
    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the frame dimensions.
    #[inline]
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    /// Returns the position in the source stack.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count()
    }

    /// Sample at `(x, y)`.
    ///
    /// # Panics
    /// If the coordinates are outside the frame.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[y * self.width + x]
    }

    /// Iterates `(x, y, value)` over all pixels in row-major order.
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let width = self.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % width, i / width, v))
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("index", &self.index)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}
