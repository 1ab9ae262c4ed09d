//! Box geometry and coordinate normalization.
//!
//! OCR engines report word boxes in source-pixel coordinates. LayoutLM-family
//! models expect resolution-independent boxes on a fixed `[0, 1000]` grid.

use crate::core::constants::NORMALIZED_GRID_SIZE;
use crate::core::errors::DigitizerError;
use serde::{Deserialize, Serialize};

/// A word box in source-pixel coordinates, as reported by OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelBox {
    /// Creates a new pixel box.
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> u64 {
        self.left as u64 + self.width as u64
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> u64 {
        self.top as u64 + self.height as u64
    }
}

/// A box on the `[0, 1000]` grid, as corners `(x0, y0)` - `(x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NormalizedBox {
    /// Left edge.
    pub x0: u32,
    /// Top edge.
    pub y0: u32,
    /// Right edge.
    pub x1: u32,
    /// Bottom edge.
    pub y1: u32,
}

impl NormalizedBox {
    /// The all-zero box the classifier assigns to special tokens.
    pub const ZERO: NormalizedBox = NormalizedBox {
        x0: 0,
        y0: 0,
        x1: 0,
        y1: 0,
    };

    /// Creates a new normalized box.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Returns the box as the `[x0, y0, x1, y1]` layout the model consumes.
    pub fn to_array(&self) -> [i64; 4] {
        [
            self.x0 as i64,
            self.y0 as i64,
            self.x1 as i64,
            self.y1 as i64,
        ]
    }
}

/// Rescales a pixel box of an `image_width` x `image_height` image onto the
/// `[0, 1000]` grid.
///
/// Each coordinate is `1000 * coord / dimension` truncated toward zero.
/// Boxes reaching past the image edge are clamped to 1000.
///
/// # Errors
///
/// Returns [`DigitizerError::InvalidImage`] when either dimension is zero.
pub fn normalize_box(
    pixel_box: &PixelBox,
    image_width: u32,
    image_height: u32,
) -> Result<NormalizedBox, DigitizerError> {
    if image_width == 0 || image_height == 0 {
        return Err(DigitizerError::InvalidImage {
            width: image_width,
            height: image_height,
        });
    }

    let scale = |coord: u64, dimension: u32| -> u32 {
        let grid = NORMALIZED_GRID_SIZE as u64;
        ((grid * coord) / dimension as u64).min(grid) as u32
    };

    Ok(NormalizedBox {
        x0: scale(pixel_box.left as u64, image_width),
        y0: scale(pixel_box.top as u64, image_height),
        x1: scale(pixel_box.right(), image_width),
        y1: scale(pixel_box.bottom(), image_height),
    })
}

/// Normalizes every box of an image, failing on the first invalid one.
pub fn normalize_boxes(
    pixel_boxes: &[PixelBox],
    image_width: u32,
    image_height: u32,
) -> Result<Vec<NormalizedBox>, DigitizerError> {
    pixel_boxes
        .iter()
        .map(|b| normalize_box(b, image_width, image_height))
        .collect()
}
