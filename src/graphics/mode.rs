//! Negotiated display mode and off-screen pixel storage.

use crate::graphics::backend::ScreenInfo;
use crate::graphics::color::{ChannelOrder, Color};
use crate::graphics::error::{FbError, FbResult};

/// Largest off-screen buffer an open will allocate, in bytes.
pub const MAX_BUFFER_BYTES: usize = 1 << 30;

/// Display mode of an open device. Read-only once the device is open.
///
/// A closed slot holds `DisplayMode::default()`, whose `fb_size_b` is zero;
/// callers that only see a mode snapshot use that to tell "not open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMode {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub bits_per_pixel: u32,
    pub channel_order: ChannelOrder,
    /// Off-screen buffer size in bytes, always derived from the fields above.
    pub fb_size_b: usize,
}

impl DisplayMode {
    /// Negotiate a mode from what device `number` reported.
    pub fn negotiate(number: u8, info: &ScreenInfo) -> FbResult<Self> {
        if info.bits_per_pixel != 16 && info.bits_per_pixel != 32 {
            return Err(FbError::UnsupportedDepth(info.bits_per_pixel));
        }
        if info.xres == 0 || info.yres == 0 {
            return Err(FbError::ModeQueryFailed {
                number,
                reason: format!("empty resolution {}x{}", info.xres, info.yres),
            });
        }
        if info.xres_virtual < info.xres || info.yres_virtual < info.yres {
            return Err(FbError::ModeQueryFailed {
                number,
                reason: format!(
                    "virtual resolution {}x{} smaller than visible {}x{}",
                    info.xres_virtual, info.yres_virtual, info.xres, info.yres
                ),
            });
        }

        let fb_size_b = (info.xres_virtual as usize)
            .checked_mul(info.yres_virtual as usize)
            .and_then(|pixels| pixels.checked_mul(info.bits_per_pixel as usize / 8))
            .ok_or_else(|| FbError::ModeQueryFailed {
                number,
                reason: format!(
                    "virtual resolution {}x{} at {} bpp has no addressable size",
                    info.xres_virtual, info.yres_virtual, info.bits_per_pixel
                ),
            })?;

        Ok(Self {
            xres: info.xres,
            yres: info.yres,
            xres_virtual: info.xres_virtual,
            yres_virtual: info.yres_virtual,
            bits_per_pixel: info.bits_per_pixel,
            channel_order: ChannelOrder::from_offsets(info.red_offset, info.blue_offset),
            fb_size_b,
        })
    }

    /// Whether this mode belongs to an open device.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.fb_size_b != 0
    }

    /// `(xres, yres, bits_per_pixel)`.
    #[must_use]
    pub const fn resolution(&self) -> (u32, u32, u32) {
        (self.xres, self.yres, self.bits_per_pixel)
    }

    /// Whether `(x, y)` lies on the visible screen.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.xres) && y < i64::from(self.yres)
    }
}

/// Off-screen buffer, tagged by element width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelBuffer {
    Rgb16(Vec<u16>),
    Rgba32(Vec<u32>),
}

impl PixelBuffer {
    /// Allocate a zeroed buffer of `mode.fb_size_b` bytes. Sizes above
    /// [`MAX_BUFFER_BYTES`] fail with `OutOfMemory` without allocating.
    pub fn allocate(mode: &DisplayMode) -> FbResult<Self> {
        if mode.fb_size_b > MAX_BUFFER_BYTES {
            return Err(FbError::OutOfMemory(mode.fb_size_b));
        }
        match mode.bits_per_pixel {
            16 => zeroed(mode.fb_size_b / 2)
                .map(Self::Rgb16)
                .ok_or(FbError::OutOfMemory(mode.fb_size_b)),
            32 => zeroed(mode.fb_size_b / 4)
                .map(Self::Rgba32)
                .ok_or(FbError::OutOfMemory(mode.fb_size_b)),
            bpp => Err(FbError::UnsupportedDepth(bpp)),
        }
    }

    /// Number of pixel elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Rgb16(pixels) => pixels.len(),
            Self::Rgba32(pixels) => pixels.len(),
        }
    }

    /// Whether the buffer holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `color` at element `index`, picking the encoding that matches
    /// the element width. Panics if `index` is out of range.
    #[inline]
    pub fn put(&mut self, index: usize, color: Color) {
        match self {
            Self::Rgb16(pixels) => pixels[index] = color.rgb16(),
            Self::Rgba32(pixels) => pixels[index] = color.rgba32(),
        }
    }

    /// Raw value at element `index`, widened to `u32`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            Self::Rgb16(pixels) => pixels.get(index).map(|&p| u32::from(p)),
            Self::Rgba32(pixels) => pixels.get(index).copied(),
        }
    }

    /// Set every element to `color`.
    pub fn fill(&mut self, color: Color) {
        match self {
            Self::Rgb16(pixels) => pixels.fill(color.rgb16()),
            Self::Rgba32(pixels) => pixels.fill(color.rgba32()),
        }
    }

    /// The buffer in native byte order, as written to the device.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Rgb16(pixels) => {
                // SAFETY: u16 has no padding and u8 has alignment 1; the
                // slice covers exactly the vector's initialized elements.
                unsafe {
                    std::slice::from_raw_parts(
                        pixels.as_ptr().cast::<u8>(),
                        std::mem::size_of_val(pixels.as_slice()),
                    )
                }
            }
            Self::Rgba32(pixels) => {
                // SAFETY: as above, for u32.
                unsafe {
                    std::slice::from_raw_parts(
                        pixels.as_ptr().cast::<u8>(),
                        std::mem::size_of_val(pixels.as_slice()),
                    )
                }
            }
        }
    }
}

fn zeroed<T: Default + Clone>(len: usize) -> Option<Vec<T>> {
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).ok()?;
    pixels.resize(len, T::default());
    Some(pixels)
}
