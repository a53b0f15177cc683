//! Property-based tests for descriptor validation and pixel composition
//!
//! These run against the pure data path only, so no application or GUI
//! thread is involved.

use pixwatch_rs::render::compose;
use pixwatch_rs::{BufferDescriptor, CapturedBuffer, ElementType};
use proptest::prelude::*;

/// Valid layout strings per channel count
fn layouts_for(channels: u8) -> &'static [&'static str] {
    match channels {
        1 => &["r", "g", "b", "a"],
        2 => &["rg", "gr", "ra"],
        3 => &["rgb", "bgr", "gbr"],
        4 => &["rgba", "bgra", "abgr"],
        _ => unreachable!("strategy only produces 1..=4 channels"),
    }
}

fn element_types() -> impl Strategy<Value = ElementType> {
    prop_oneof![
        Just(ElementType::U8),
        Just(ElementType::I8),
        Just(ElementType::U16),
        Just(ElementType::I16),
        Just(ElementType::U32),
        Just(ElementType::I32),
        Just(ElementType::F32),
        Just(ElementType::F64),
    ]
}

proptest! {
    #[test]
    fn valid_descriptors_pass_validation(
        width in 1..32u32,
        height in 1..16u32,
        channels in 1..=4u8,
        padding in 0..8u32,
        layout_index in 0..3usize,
        element_type in element_types(),
    ) {
        let row_stride = width + padding;
        let pixel_layout = layouts_for(channels)[layout_index % layouts_for(channels).len()];
        let bytes = row_stride as usize
            * height as usize
            * channels as usize
            * element_type.size_bytes();
        let data = vec![0u8; bytes];

        let desc = BufferDescriptor {
            data: &data,
            display_name: "prop",
            width,
            height,
            channels,
            element_type,
            row_stride,
            pixel_layout,
        };
        prop_assert!(desc.validate().is_ok());

        // composition of any valid buffer yields a full RGBA8 image
        let image = compose(&CapturedBuffer::capture(&desc));
        prop_assert_eq!(image.width, width);
        prop_assert_eq!(image.height, height);
        prop_assert_eq!(image.pixels.len(), (width * height * 4) as usize);
    }

    #[test]
    fn out_of_range_channel_counts_fail(
        width in 1..32u32,
        height in 1..16u32,
        channels in 5..=16u8,
    ) {
        let data = vec![0u8; (width * height * 16) as usize];
        let desc = BufferDescriptor {
            data: &data,
            display_name: "prop",
            width,
            height,
            channels,
            element_type: ElementType::U8,
            row_stride: width,
            pixel_layout: "rgba",
        };
        prop_assert!(desc.validate().is_err());
    }

    #[test]
    fn stride_below_width_fails(
        width in 2..32u32,
        height in 1..16u32,
    ) {
        let data = vec![0u8; (width * height) as usize];
        let desc = BufferDescriptor {
            data: &data,
            display_name: "prop",
            width,
            height,
            channels: 1,
            element_type: ElementType::U8,
            row_stride: width - 1,
            pixel_layout: "r",
        };
        prop_assert!(desc.validate().is_err());
    }

    #[test]
    fn layout_length_mismatch_fails(
        width in 1..16u32,
        height in 1..8u32,
        channels in 1..=4u8,
        layout in "[rgba]{1,4}",
    ) {
        prop_assume!(layout.chars().count() != channels as usize);
        let data = vec![0u8; (width * height * 4) as usize];
        let desc = BufferDescriptor {
            data: &data,
            display_name: "prop",
            width,
            height,
            channels,
            element_type: ElementType::U8,
            row_stride: width,
            pixel_layout: &layout,
        };
        prop_assert!(desc.validate().is_err());
    }
}
