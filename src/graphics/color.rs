//! Color model conversion.
//!
//! A [`Color`] carries both native pixel encodings the renderer writes:
//! the 32-bit `0xAARRGGBB` value and its 16-bit RGB565 reduction. Both are
//! computed once when the color is built, so the drawing loops only pick the
//! field matching the buffer depth.
//!
//! The logical packing is fixed: red in bits 16..24, green in 8..16, blue in
//! 0..8 (32-bit) and red in 11..16, green in 5..11, blue in 0..5 (16-bit).
//! Devices that store blue in the high bits are handled by
//! [`Color::with_channel_order`], applied once per draw call.

/// Channel order of a device's in-memory pixels, resolved once at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelOrder {
    /// Red in the high bits, blue in the low bits (XRGB8888, RGB565).
    #[default]
    Rgb,
    /// Blue in the high bits, red in the low bits (XBGR8888, BGR565).
    Bgr,
}

impl ChannelOrder {
    /// Resolve the order from the bit offsets a device reports for its red
    /// and blue channels.
    #[must_use]
    pub const fn from_offsets(red_offset: u32, blue_offset: u32) -> Self {
        if red_offset < blue_offset {
            Self::Bgr
        } else {
            Self::Rgb
        }
    }
}

/// A color in both native encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    rgba32: u32,
    rgb16: u16,
}

impl Color {
    /// Build from a 32-bit `0xAARRGGBB` value. The alpha byte is kept in the
    /// 32-bit encoding but takes no part in the 16-bit reduction.
    #[must_use]
    pub const fn from_rgba32(value: u32) -> Self {
        let r = (value >> 16) & 0xFF;
        let g = (value >> 8) & 0xFF;
        let b = value & 0xFF;
        let rgb16 = ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3);

        Self {
            rgba32: value,
            rgb16: rgb16 as u16,
        }
    }

    /// Build from a 16-bit RGB565 value. Each channel is scaled up to eight
    /// bits and the alpha byte is forced opaque.
    #[must_use]
    pub const fn from_rgb16(value: u16) -> Self {
        let value32 = value as u32;
        let r = ((value32 & 0xF800) >> 11) * 255 / 31;
        let g = ((value32 & 0x07E0) >> 5) * 255 / 63;
        let b = (value32 & 0x001F) * 255 / 31;

        Self {
            rgba32: 0xFF00_0000 | (r << 16) | (g << 8) | b,
            rgb16: value,
        }
    }

    /// Alias of [`Color::from_rgba32`] for values coming from a host binding.
    #[must_use]
    pub const fn from_value(value: u32) -> Self {
        Self::from_rgba32(value)
    }

    /// The 32-bit `0xAARRGGBB` encoding.
    #[must_use]
    pub const fn rgba32(self) -> u32 {
        self.rgba32
    }

    /// The 16-bit RGB565 encoding.
    #[must_use]
    pub const fn rgb16(self) -> u16 {
        self.rgb16
    }

    /// Re-encode for a device whose channel order differs from the logical one.
    #[must_use]
    pub const fn with_channel_order(self, order: ChannelOrder) -> Self {
        match order {
            ChannelOrder::Rgb => self,
            ChannelOrder::Bgr => {
                let v = self.rgba32;
                let v16 = self.rgb16;
                Self {
                    rgba32: (v & 0xFF00_FF00) | ((v >> 16) & 0xFF) | ((v & 0xFF) << 16),
                    rgb16: (v16 & 0x07E0) | (v16 >> 11) | ((v16 & 0x001F) << 11),
                }
            }
        }
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Self::from_rgba32(value)
    }
}

/// Opaque color from 8-bit channels.
#[must_use]
pub const fn rgb(red: u8, green: u8, blue: u8) -> Color {
    rgba(red, green, blue, 0xFF)
}

/// Color from 8-bit channels with alpha. Alpha only survives on 32-bit
/// devices.
#[must_use]
pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
    Color::from_rgba32(
        ((alpha as u32) << 24) | ((red as u32) << 16) | ((green as u32) << 8) | blue as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x00FF_0000, 0xF800)]
    #[case(0x0000_FF00, 0x07E0)]
    #[case(0x0000_00FF, 0x001F)]
    #[case(0x00FF_FFFF, 0xFFFF)]
    #[case(0xFF00_0000, 0x0000)]
    #[case(0x0012_3456, 0x11AA)]
    fn test_from_rgba32_reduces_to_565(#[case] input: u32, #[case] expected: u16) {
        let color = Color::from_rgba32(input);
        assert_eq!(color.rgb16(), expected);
        assert_eq!(color.rgba32(), input);
    }

    #[rstest]
    #[case(0xF800, 0xFFFF_0000)]
    #[case(0x07E0, 0xFF00_FF00)]
    #[case(0x001F, 0xFF00_00FF)]
    #[case(0x0000, 0xFF00_0000)]
    #[case(0xFFFF, 0xFFFF_FFFF)]
    #[case(0x8410, 0xFF83_8183)]
    fn test_from_rgb16_expands_to_opaque_32(#[case] input: u16, #[case] expected: u32) {
        let color = Color::from_rgb16(input);
        assert_eq!(color.rgba32(), expected);
        assert_eq!(color.rgb16(), input);
    }

    #[test]
    fn test_rgb_helpers() {
        assert_eq!(rgb(255, 0, 0).rgba32(), 0xFFFF_0000);
        assert_eq!(rgb(255, 0, 0).rgb16(), 0xF800);
        assert_eq!(rgba(1, 2, 3, 4).rgba32(), 0x0401_0203);
        assert_eq!(Color::from(0x00AB_CDEF), Color::from_value(0x00AB_CDEF));
    }

    #[test]
    fn test_channel_order_from_offsets() {
        assert_eq!(ChannelOrder::from_offsets(16, 0), ChannelOrder::Rgb);
        assert_eq!(ChannelOrder::from_offsets(11, 0), ChannelOrder::Rgb);
        assert_eq!(ChannelOrder::from_offsets(0, 16), ChannelOrder::Bgr);
        assert_eq!(ChannelOrder::from_offsets(0, 0), ChannelOrder::Rgb);
    }

    #[test]
    fn test_bgr_swaps_red_and_blue() {
        let red = rgb(255, 0, 0).with_channel_order(ChannelOrder::Bgr);
        assert_eq!(red.rgba32(), 0xFF00_00FF);
        assert_eq!(red.rgb16(), 0x001F);

        let green = rgb(0, 255, 0).with_channel_order(ChannelOrder::Bgr);
        assert_eq!(green.rgba32(), 0xFF00_FF00);
        assert_eq!(green.rgb16(), 0x07E0);
    }

    #[test]
    fn test_rgb_order_is_identity() {
        let color = Color::from_rgba32(0x1234_5678);
        assert_eq!(color.with_channel_order(ChannelOrder::Rgb), color);
    }

    proptest! {
        #[test]
        fn prop_encodings_agree(value in any::<u32>()) {
            let color = Color::from_rgba32(value);
            let r = (value >> 16) & 0xFF;
            let g = (value >> 8) & 0xFF;
            let b = value & 0xFF;
            prop_assert_eq!(u32::from(color.rgb16() >> 11), r >> 3);
            prop_assert_eq!(u32::from((color.rgb16() >> 5) & 0x3F), g >> 2);
            prop_assert_eq!(u32::from(color.rgb16() & 0x1F), b >> 3);
        }

        #[test]
        fn prop_565_round_trip_is_stable(value in any::<u16>()) {
            // 565 -> 8888 -> 565 must land on the same 16-bit value.
            let expanded = Color::from_rgb16(value);
            prop_assert_eq!(Color::from_rgba32(expanded.rgba32()).rgb16(), value);
        }

        #[test]
        fn prop_bgr_is_an_involution(value in any::<u32>()) {
            let color = Color::from_rgba32(value);
            let twice = color
                .with_channel_order(ChannelOrder::Bgr)
                .with_channel_order(ChannelOrder::Bgr);
            prop_assert_eq!(twice, color);
        }
    }
}
