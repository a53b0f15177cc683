//! Core data types for buffer handoff
//!
//! This module contains the data structures that cross the host/GUI boundary:
//! the borrowed descriptor a host debugger hands to [`plot_buffer`], and the
//! owned copy the window keeps for rendering.
//!
//! # Main Types
//!
//! - [`ElementType`] - Enum of supported pixel element types (u8, u16, f32, etc.)
//! - [`BufferDescriptor`] - Borrowed view of one plottable buffer (pointer + metadata)
//! - [`CapturedBuffer`] - Owned copy taken synchronously during `plot_buffer`
//!
//! # Ownership
//!
//! A [`BufferDescriptor`] never owns the pixel memory it points at; the borrow
//! lasts exactly as long as the `plot_buffer` call. The window copies the bytes
//! it needs into a [`CapturedBuffer`] before returning, so the caller is free
//! to reuse or free its buffer immediately afterwards.
//!
//! [`plot_buffer`]: crate::handle::WindowHandler::plot_buffer

use crate::error::{PixWatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The set of channel selectors a pixel layout string may use
pub const CHANNEL_SELECTORS: [char; 4] = ['r', 'g', 'b', 'a'];

/// Represents the element type of a pixel channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ElementType {
    /// 8-bit unsigned integer
    #[default]
    U8,
    /// 8-bit signed integer
    I8,
    /// 16-bit unsigned integer
    U16,
    /// 16-bit signed integer
    I16,
    /// 32-bit unsigned integer
    U32,
    /// 32-bit signed integer
    I32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl ElementType {
    /// Returns the size in bytes of one element of this type
    pub fn size_bytes(&self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    /// Parse one element from raw little-endian bytes and normalize it to
    /// the 0.0..=1.0 display range.
    ///
    /// Unsigned integers map their full range onto 0..=1, signed integers are
    /// offset so their minimum lands on 0.0, and floats are clamped.
    pub fn sample(&self, bytes: &[u8]) -> Option<f32> {
        if bytes.len() < self.size_bytes() {
            return None;
        }

        Some(match self {
            ElementType::U8 => bytes[0] as f32 / u8::MAX as f32,
            ElementType::I8 => (bytes[0] as i8 as f32 - i8::MIN as f32) / u8::MAX as f32,
            ElementType::U16 => {
                u16::from_le_bytes([bytes[0], bytes[1]]) as f32 / u16::MAX as f32
            }
            ElementType::I16 => {
                (i16::from_le_bytes([bytes[0], bytes[1]]) as f32 - i16::MIN as f32)
                    / u16::MAX as f32
            }
            ElementType::U32 => {
                (u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
                    / u32::MAX as f64) as f32
            }
            ElementType::I32 => {
                ((i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
                    - i32::MIN as f64)
                    / u32::MAX as f64) as f32
            }
            ElementType::F32 => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]).clamp(0.0, 1.0)
            }
            ElementType::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])
            .clamp(0.0, 1.0) as f32,
        })
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::U8 => write!(f, "u8"),
            ElementType::I8 => write!(f, "i8"),
            ElementType::U16 => write!(f, "u16"),
            ElementType::I16 => write!(f, "i16"),
            ElementType::U32 => write!(f, "u32"),
            ElementType::I32 => write!(f, "i32"),
            ElementType::F32 => write!(f, "f32"),
            ElementType::F64 => write!(f, "f64"),
        }
    }
}

/// Borrowed description of one plottable buffer.
///
/// The pixel memory stays owned by the caller; it must remain valid for the
/// duration of the `plot_buffer` call, which the borrow enforces.
#[derive(Clone, Copy)]
pub struct BufferDescriptor<'a> {
    /// Raw pixel bytes, little-endian elements, rows separated by `row_stride`
    pub data: &'a [u8],
    /// Name the buffer is displayed (and bound) under; never empty
    pub display_name: &'a str,
    /// Buffer width in pixels
    pub width: u32,
    /// Buffer height in pixels
    pub height: u32,
    /// Number of channels per pixel (1 to 4)
    pub channels: u8,
    /// Element type of each channel value
    pub element_type: ElementType,
    /// Row stride in elements (>= width)
    pub row_stride: u32,
    /// Channel layout string, a distinct subset of "rgba" matching `channels`
    pub pixel_layout: &'a str,
}

impl BufferDescriptor<'_> {
    /// Number of bytes the descriptor claims to reference
    pub fn required_bytes(&self) -> usize {
        self.row_stride as usize
            * self.height as usize
            * self.channels as usize
            * self.element_type.size_bytes()
    }

    /// Check all descriptor invariants.
    ///
    /// Returns [`PixWatchError::InvalidBufferDescriptor`] on the first
    /// violation found; a failed validation leaves no trace in any window.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(PixWatchError::invalid_descriptor(self.display_name, reason));

        if self.display_name.is_empty() {
            return Err(PixWatchError::invalid_descriptor(
                "<unnamed>",
                "display name must not be empty",
            ));
        }
        if self.width == 0 || self.height == 0 {
            return fail(format!(
                "dimensions must be nonzero (got {}x{})",
                self.width, self.height
            ));
        }
        if self.channels == 0 || self.channels > 4 {
            return fail(format!(
                "channel count must be between 1 and 4 (got {})",
                self.channels
            ));
        }
        if self.row_stride < self.width {
            return fail(format!(
                "row stride ({}) must be at least the width ({})",
                self.row_stride, self.width
            ));
        }
        if self.pixel_layout.chars().count() != self.channels as usize {
            return fail(format!(
                "pixel layout '{}' must name exactly {} channels",
                self.pixel_layout, self.channels
            ));
        }
        let mut seen = [false; 4];
        for c in self.pixel_layout.chars() {
            let Some(slot) = CHANNEL_SELECTORS.iter().position(|&s| s == c) else {
                return fail(format!("pixel layout character '{c}' is not one of r, g, b, a"));
            };
            if seen[slot] {
                return fail(format!("pixel layout '{}' repeats '{c}'", self.pixel_layout));
            }
            seen[slot] = true;
        }
        if self.data.len() < self.required_bytes() {
            return fail(format!(
                "buffer holds {} bytes but the metadata describes {}",
                self.data.len(),
                self.required_bytes()
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for BufferDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferDescriptor")
            .field("display_name", &self.display_name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("element_type", &self.element_type)
            .field("row_stride", &self.row_stride)
            .field("pixel_layout", &self.pixel_layout)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Owned copy of a plotted buffer, independent of the caller's memory.
///
/// Created by [`CapturedBuffer::capture`] during `plot_buffer`; only the bytes
/// the metadata actually describes are copied.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedBuffer {
    pub display_name: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub element_type: ElementType,
    pub row_stride: u32,
    pub pixel_layout: String,
    pub data: Vec<u8>,
}

impl CapturedBuffer {
    /// Copy a validated descriptor into an owned buffer.
    ///
    /// The descriptor must have passed [`BufferDescriptor::validate`]; excess
    /// bytes beyond the described extent are not copied.
    pub fn capture(desc: &BufferDescriptor<'_>) -> Self {
        Self {
            display_name: desc.display_name.to_string(),
            width: desc.width,
            height: desc.height,
            channels: desc.channels,
            element_type: desc.element_type,
            row_stride: desc.row_stride,
            pixel_layout: desc.pixel_layout.to_string(),
            data: desc.data[..desc.required_bytes()].to_vec(),
        }
    }

    /// One-line metadata summary for status displays
    pub fn summary(&self) -> String {
        format!(
            "{}x{} {}ch {} stride {} ({})",
            self.width,
            self.height,
            self.channels,
            self.element_type,
            self.row_stride,
            self.pixel_layout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor<'a>(data: &'a [u8]) -> BufferDescriptor<'a> {
        BufferDescriptor {
            data,
            display_name: "img",
            width: 4,
            height: 2,
            channels: 3,
            element_type: ElementType::U8,
            row_stride: 4,
            pixel_layout: "rgb",
        }
    }

    #[test]
    fn test_element_type_size() {
        assert_eq!(ElementType::U8.size_bytes(), 1);
        assert_eq!(ElementType::I16.size_bytes(), 2);
        assert_eq!(ElementType::U32.size_bytes(), 4);
        assert_eq!(ElementType::F32.size_bytes(), 4);
        assert_eq!(ElementType::F64.size_bytes(), 8);
    }

    #[test]
    fn test_sample_normalization() {
        assert_eq!(ElementType::U8.sample(&[255]), Some(1.0));
        assert_eq!(ElementType::U8.sample(&[0]), Some(0.0));

        // i16 zero sits at the middle of the shifted range
        let mid = ElementType::I16.sample(&0i16.to_le_bytes()).unwrap();
        assert!((mid - 0.5).abs() < 0.001);
        assert_eq!(ElementType::I16.sample(&i16::MIN.to_le_bytes()), Some(0.0));

        // floats are clamped to the display range
        assert_eq!(ElementType::F32.sample(&2.5f32.to_le_bytes()), Some(1.0));
        assert_eq!(ElementType::F32.sample(&(-1.0f32).to_le_bytes()), Some(0.0));
        let v = ElementType::F64.sample(&0.25f64.to_le_bytes()).unwrap();
        assert!((v - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_sample_short_input() {
        assert_eq!(ElementType::U32.sample(&[1, 2]), None);
    }

    #[test]
    fn test_validate_accepts_typical_rgb_buffer() {
        let data = vec![0u8; 4 * 2 * 3];
        assert!(descriptor(&data).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_channel_counts() {
        let data = vec![0u8; 64];
        for channels in [0u8, 5, 9] {
            let desc = BufferDescriptor {
                channels,
                ..descriptor(&data)
            };
            assert!(desc.validate().is_err(), "channels={channels} must fail");
        }
    }

    #[test]
    fn test_validate_rejects_layout_mismatch() {
        let data = vec![0u8; 64];
        let desc = BufferDescriptor {
            pixel_layout: "rgba",
            ..descriptor(&data)
        };
        assert!(desc.validate().is_err());

        let desc = BufferDescriptor {
            pixel_layout: "rgg",
            ..descriptor(&data)
        };
        assert!(desc.validate().is_err());

        let desc = BufferDescriptor {
            pixel_layout: "rgx",
            ..descriptor(&data)
        };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_small_stride_and_short_data() {
        let data = vec![0u8; 64];
        let desc = BufferDescriptor {
            row_stride: 3,
            ..descriptor(&data)
        };
        assert!(desc.validate().is_err());

        let short = vec![0u8; 5];
        assert!(descriptor(&short).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let data = vec![0u8; 64];
        let desc = BufferDescriptor {
            display_name: "",
            ..descriptor(&data)
        };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_capture_copies_only_described_extent() {
        let mut data = vec![7u8; 4 * 2 * 3];
        data.extend_from_slice(&[99, 99, 99]); // trailing bytes outside the extent
        let desc = descriptor(&data);
        let captured = CapturedBuffer::capture(&desc);
        assert_eq!(captured.data.len(), 4 * 2 * 3);
        assert!(captured.data.iter().all(|&b| b == 7));
        assert_eq!(captured.display_name, "img");
    }
}
