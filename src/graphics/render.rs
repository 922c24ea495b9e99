//! Drawing primitives.
//!
//! [`Surface`] holds the unchecked primitives. It can only be built from a
//! locked [`DeviceSlot`], so every unchecked write happens with the slot lock
//! held. Coordinates passed to the unchecked forms must already be on
//! screen; the circle and ellipse rasterizers are the exception and clip
//! each pixel themselves.
//!
//! The checked entry points are methods of [`DeviceTable`]. Each one
//! validates the device number, locks the slot, requires it to be open,
//! validates its coordinates against the negotiated resolution, converts the
//! color to the device's channel order and only then draws.

use crate::graphics::color::Color;
use crate::graphics::error::{FbError, FbResult};
use crate::graphics::mode::{DisplayMode, PixelBuffer};
use crate::graphics::raster;
use crate::graphics::table::{DeviceSlot, DeviceTable};

/// Mutable view of an open slot's off-screen buffer.
pub(crate) struct Surface<'a> {
    buffer: &'a mut PixelBuffer,
    mode: DisplayMode,
}

impl<'a> Surface<'a> {
    /// View of `slot`'s buffer, or `None` if the slot is closed.
    pub(crate) fn new(slot: &'a mut DeviceSlot) -> Option<Self> {
        let mode = slot.mode;
        let buffer = slot.buffer.as_mut()?;
        Some(Self { buffer, mode })
    }

    /// `color` re-encoded for this device's channel order.
    pub(crate) fn native(&self, color: Color) -> Color {
        color.with_channel_order(self.mode.channel_order)
    }

    /// Fail with `OutOfBounds` unless `(x, y)` is on screen.
    fn require(&self, x: i64, y: i64) -> FbResult<()> {
        if self.mode.contains(x, y) {
            Ok(())
        } else {
            Err(FbError::OutOfBounds { x, y })
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.mode.xres as usize + x as usize
    }

    /// Write one pixel. `(x, y)` must be on screen.
    #[inline]
    pub(crate) fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.buffer.put(index, color);
    }

    /// Raw stored value at `(x, y)`, which must be on screen.
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.buffer.get(self.index(x, y))
    }

    /// Horizontal run of `len` pixels starting at `(x, y)`.
    pub(crate) fn draw_horizontal_line(&mut self, x: u32, y: u32, len: u32, color: Color) {
        for dx in 0..len {
            self.set_pixel(x + dx, y, color);
        }
    }

    /// Vertical run of `len` pixels starting at `(x, y)`.
    pub(crate) fn draw_vertical_line(&mut self, x: u32, y: u32, len: u32, color: Color) {
        for dy in 0..len {
            self.set_pixel(x, y + dy, color);
        }
    }

    /// Line between two on-screen points, endpoints included.
    ///
    /// Axis-aligned lines go through the run primitives; everything else is
    /// stepped with Bresenham.
    pub(crate) fn draw_line(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, color: Color) {
        if y1 == y2 {
            let (begin, end) = (x1.min(x2), x1.max(x2));
            self.draw_horizontal_line(begin, y1, end - begin + 1, color);
            return;
        }
        if x1 == x2 {
            let (begin, end) = (y1.min(y2), y1.max(y2));
            self.draw_vertical_line(x1, begin, end - begin + 1, color);
            return;
        }

        raster::line(
            i64::from(x1),
            i64::from(y1),
            i64::from(x2),
            i64::from(y2),
            |x, y| self.set_pixel(x as u32, y as u32, color),
        );
    }

    /// Write `(x, y)` if it is on screen, drop it otherwise.
    #[inline]
    fn plot_clipped(&mut self, x: i64, y: i64, color: Color) {
        if self.mode.contains(x, y) {
            self.set_pixel(x as u32, y as u32, color);
        }
    }

    /// Circle outline around `(xm, ym)`. Off-screen pixels are clipped.
    pub(crate) fn draw_circle(&mut self, xm: i64, ym: i64, radius: i64, color: Color) {
        if !outline_reaches_screen(&self.mode, xm, ym, radius, radius) {
            return;
        }
        raster::circle(xm, ym, radius, |x, y| self.plot_clipped(x, y, color));
    }

    /// Ellipse outline around `(xm, ym)`. Off-screen pixels are clipped.
    pub(crate) fn draw_ellipse(&mut self, xm: i64, ym: i64, a: i64, b: i64, color: Color) {
        if !outline_reaches_screen(&self.mode, xm, ym, a, b) {
            return;
        }
        raster::ellipse(xm, ym, a, b, |x, y| self.plot_clipped(x, y, color));
    }

    /// Set every element of the buffer.
    pub(crate) fn fill(&mut self, color: Color) {
        self.buffer.fill(color);
    }
}

/// Whether the outline of the ellipse with semi-axes `a` and `b` around
/// `(xm, ym)` can put a pixel on screen.
///
/// The rasterized outline stays within a pixel of the true curve. With both
/// semi-axes at least 4, scaling the ellipse by `1 +- 3/min(a, b)` gives
/// curves more than two pixels away from it, so a screen wholly outside the
/// larger one or wholly inside the smaller one gets nothing.
fn outline_reaches_screen(mode: &DisplayMode, xm: i64, ym: i64, a: i64, b: i64) -> bool {
    let right = i64::from(mode.xres) - 1;
    let bottom = i64::from(mode.yres) - 1;
    if xm + a < 0 || xm - a > right || ym + b < 0 || ym - b > bottom {
        return false;
    }

    let min = a.min(b);
    if min < 4 {
        return true;
    }

    // Squared distance from the center, in units of the semi-axes.
    let scaled = |x: i64, y: i64| {
        let dx = (x - xm) as f64 / a as f64;
        let dy = (y - ym) as f64 / b as f64;
        dx * dx + dy * dy
    };
    let margin = 3.0 / min as f64;

    let nearest = scaled(xm.clamp(0, right), ym.clamp(0, bottom));
    let farthest = [(0, 0), (right, 0), (0, bottom), (right, bottom)]
        .into_iter()
        .map(|(x, y)| scaled(x, y))
        .fold(0.0, f64::max);

    nearest < (1.0 + margin).powi(2) && farthest > (1.0 - margin).powi(2)
}

impl DeviceTable {
    /// Run `op` on the locked, open slot `number`.
    fn with_surface<T>(
        &self,
        number: u8,
        op: impl FnOnce(&mut Surface<'_>) -> FbResult<T>,
    ) -> FbResult<T> {
        let mut slot = self.lock_open(number)?;
        let mut surface = Surface::new(&mut slot).ok_or(FbError::NotOpen(number))?;
        op(&mut surface)
    }

    /// Set the pixel at `(x, y)` on device `number`.
    pub fn set_pixel(&self, number: u8, x: u32, y: u32, color: Color) -> FbResult<()> {
        self.with_surface(number, |surface| {
            surface.require(i64::from(x), i64::from(y))?;
            let color = surface.native(color);
            surface.set_pixel(x, y, color);
            Ok(())
        })
    }

    /// Raw value stored at `(x, y)` on device `number`, as written to the
    /// device (16-bit values are widened).
    pub fn get_pixel(&self, number: u8, x: u32, y: u32) -> FbResult<u32> {
        self.with_surface(number, |surface| {
            surface.require(i64::from(x), i64::from(y))?;
            surface.pixel(x, y).ok_or(FbError::OutOfBounds {
                x: i64::from(x),
                y: i64::from(y),
            })
        })
    }

    /// Horizontal run of `len` pixels from `(x, y)` to the right. The whole
    /// run must be on screen; `len == 0` draws nothing.
    pub fn draw_horizontal_line(
        &self,
        number: u8,
        x: u32,
        y: u32,
        len: u32,
        color: Color,
    ) -> FbResult<()> {
        if usize::from(number) >= self.capacity() {
            return Err(FbError::InvalidDevice(number));
        }
        if len == 0 {
            return Ok(());
        }

        self.with_surface(number, |surface| {
            let last = i64::from(x) + i64::from(len) - 1;
            surface.require(i64::from(x), i64::from(y))?;
            surface.require(last, i64::from(y))?;
            let color = surface.native(color);
            surface.draw_horizontal_line(x, y, len, color);
            Ok(())
        })
    }

    /// Vertical run of `len` pixels from `(x, y)` downwards. The whole run
    /// must be on screen; `len == 0` draws nothing.
    pub fn draw_vertical_line(
        &self,
        number: u8,
        x: u32,
        y: u32,
        len: u32,
        color: Color,
    ) -> FbResult<()> {
        if usize::from(number) >= self.capacity() {
            return Err(FbError::InvalidDevice(number));
        }
        if len == 0 {
            return Ok(());
        }

        self.with_surface(number, |surface| {
            let last = i64::from(y) + i64::from(len) - 1;
            surface.require(i64::from(x), i64::from(y))?;
            surface.require(i64::from(x), last)?;
            let color = surface.native(color);
            surface.draw_vertical_line(x, y, len, color);
            Ok(())
        })
    }

    /// Line from `(x1, y1)` to `(x2, y2)`. Both endpoints must be on screen.
    pub fn draw_line(
        &self,
        number: u8,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        color: Color,
    ) -> FbResult<()> {
        self.with_surface(number, |surface| {
            surface.require(i64::from(x1), i64::from(y1))?;
            surface.require(i64::from(x2), i64::from(y2))?;
            let color = surface.native(color);
            surface.draw_line(x1, y1, x2, y2, color);
            Ok(())
        })
    }

    /// Circle outline. The center may lie anywhere; pixels that fall off
    /// screen are dropped.
    pub fn draw_circle(
        &self,
        number: u8,
        xm: i32,
        ym: i32,
        radius: u32,
        color: Color,
    ) -> FbResult<()> {
        self.with_surface(number, |surface| {
            let color = surface.native(color);
            surface.draw_circle(i64::from(xm), i64::from(ym), i64::from(radius), color);
            Ok(())
        })
    }

    /// Ellipse outline with semi-axes `a` (horizontal) and `b` (vertical).
    /// Pixels that fall off screen are dropped.
    pub fn draw_ellipse(
        &self,
        number: u8,
        xm: i32,
        ym: i32,
        a: u32,
        b: u32,
        color: Color,
    ) -> FbResult<()> {
        self.with_surface(number, |surface| {
            let color = surface.native(color);
            surface.draw_ellipse(
                i64::from(xm),
                i64::from(ym),
                i64::from(a),
                i64::from(b),
                color,
            );
            Ok(())
        })
    }

    /// Set every pixel of device `number`'s buffer.
    pub fn fill(&self, number: u8, color: Color) -> FbResult<()> {
        self.with_surface(number, |surface| {
            let color = surface.native(color);
            surface.fill(color);
            Ok(())
        })
    }
}
