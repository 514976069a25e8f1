/// Bounding-box normalization
///
/// Boxes are rescaled from source pixels into a fixed 0..=1000 integer grid
/// so the trainer sees the same coordinate space regardless of resolution.
/// Scaling truncates toward zero. Coordinates outside the image produce
/// values outside the grid; they are flagged, never clamped.
use std::num::NonZeroU32;

/// `[x0, y0, x1, y1]`
pub type BoundingBox = [i64; 4];

/// Side length of the normalized coordinate grid
pub const NORMALIZED_GRID: i64 = 1000;

/// Native pixel dimensions of a decoded image. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

fn scale(coord: i64, dimension: NonZeroU32) -> i64 {
    // i128 keeps 1000 * coord exact; integer division truncates toward zero
    let scaled = i128::from(coord) * i128::from(NORMALIZED_GRID) / i128::from(dimension.get());
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}

pub fn normalize_bbox(bbox: &BoundingBox, size: ImageSize) -> BoundingBox {
    [
        scale(bbox[0], size.width),
        scale(bbox[1], size.height),
        scale(bbox[2], size.width),
        scale(bbox[3], size.height),
    ]
}

pub fn normalize_bboxes(bboxes: &[BoundingBox], size: ImageSize) -> Vec<BoundingBox> {
    bboxes.iter().map(|b| normalize_bbox(b, size)).collect()
}

/// True if any normalized coordinate lies above the grid. Only the upper
/// bound is checked.
pub fn exceeds_grid(bboxes: &[BoundingBox]) -> bool {
    bboxes.iter().flatten().any(|&c| c > NORMALIZED_GRID)
}
