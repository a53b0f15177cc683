//! Pixel composition for captured buffers
//!
//! Turns a [`CapturedBuffer`] into a displayable RGBA8 image: element values
//! are normalized per [`ElementType::sample`], channels are shuffled according
//! to the buffer's pixel layout, and row padding beyond the width is skipped
//! via the row stride.
//!
//! Single-channel buffers are expanded to grayscale. Color channels missing
//! from the layout render as 0; a missing alpha channel renders opaque.
//!
//! [`ElementType::sample`]: crate::types::ElementType::sample

use crate::types::{CapturedBuffer, CHANNEL_SELECTORS};

/// A composed RGBA8 image ready for texture upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Size as `[width, height]` in usize, the shape texture APIs expect
    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }
}

/// Compose a captured buffer into an RGBA8 image.
///
/// The buffer must have passed descriptor validation; out-of-range reads
/// therefore cannot occur, and any short sample degrades to 0 rather than
/// panicking.
pub fn compose(buffer: &CapturedBuffer) -> RgbaImage {
    let width = buffer.width as usize;
    let height = buffer.height as usize;
    let channels = buffer.channels as usize;
    let stride = buffer.row_stride as usize;
    let elem_size = buffer.element_type.size_bytes();

    // Destination slot (r, g, b, a) -> source channel index within a pixel
    let mut source_of = [None; 4];
    for (index, c) in buffer.pixel_layout.chars().enumerate() {
        if let Some(slot) = CHANNEL_SELECTORS.iter().position(|&s| s == c) {
            source_of[slot] = Some(index);
        }
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let pixel_base = (y * stride + x) * channels * elem_size;
            let sample = |channel: usize| {
                let offset = pixel_base + channel * elem_size;
                buffer
                    .data
                    .get(offset..)
                    .and_then(|bytes| buffer.element_type.sample(bytes))
                    .unwrap_or(0.0)
            };

            let (r, g, b) = if channels == 1 {
                let v = sample(0);
                (v, v, v)
            } else {
                (
                    source_of[0].map(&sample).unwrap_or(0.0),
                    source_of[1].map(&sample).unwrap_or(0.0),
                    source_of[2].map(&sample).unwrap_or(0.0),
                )
            };
            let a = source_of[3].map(&sample).unwrap_or(1.0);

            pixels.extend_from_slice(&[to_u8(r), to_u8(g), to_u8(b), to_u8(a)]);
        }
    }

    RgbaImage {
        width: buffer.width,
        height: buffer.height,
        pixels,
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}
