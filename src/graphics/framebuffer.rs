//! Scoped framebuffer handle.
//!
//! [`Framebuffer`] holds one user of a device slot for as long as it lives.
//! It caches the resolution at open time and closes the slot when dropped.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fbprims::graphics::{rgb, DeviceTable, Framebuffer, LinuxFbBackend};
//!
//! let table = Arc::new(DeviceTable::new(LinuxFbBackend::default()));
//! let fb = Framebuffer::open(table, 0)?;
//! fb.draw_pixel(100, 100, rgb(255, 0, 0))?;
//! fb.update()?;
//! # Ok::<(), fbprims::graphics::FbError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use crate::graphics::color::Color;
use crate::graphics::error::FbResult;
use crate::graphics::table::DeviceTable;

/// An open framebuffer device.
pub struct Framebuffer {
    table: Arc<DeviceTable>,
    number: u8,
    xres: u32,
    yres: u32,
    depth: u32,
}

impl Framebuffer {
    /// Open device `number` in `table`.
    pub fn open(table: Arc<DeviceTable>, number: u8) -> FbResult<Self> {
        table.open(number)?;
        let (xres, yres, depth) = match table.get_resolution(number) {
            Ok(resolution) => resolution,
            Err(err) => {
                release(&table, number);
                return Err(err);
            }
        };

        Ok(Self {
            table,
            number,
            xres,
            yres,
            depth,
        })
    }

    #[must_use]
    pub fn number(&self) -> u8 {
        self.number
    }

    #[must_use]
    pub fn xres(&self) -> u32 {
        self.xres
    }

    #[must_use]
    pub fn yres(&self) -> u32 {
        self.yres
    }

    /// Bits per pixel.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The table this handle draws through.
    #[must_use]
    pub fn table(&self) -> &Arc<DeviceTable> {
        &self.table
    }

    /// Present the off-screen buffer. Nothing reaches the screen before this
    /// is called.
    pub fn update(&self) -> FbResult<()> {
        self.table.flush(self.number)
    }

    pub fn draw_pixel(&self, x: u32, y: u32, color: impl Into<Color>) -> FbResult<()> {
        self.table.set_pixel(self.number, x, y, color.into())
    }

    /// Raw stored value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> FbResult<u32> {
        self.table.get_pixel(self.number, x, y)
    }

    pub fn draw_line(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        color: impl Into<Color>,
    ) -> FbResult<()> {
        self.table.draw_line(self.number, x1, y1, x2, y2, color.into())
    }

    /// Run of `len` pixels towards the right.
    pub fn draw_horizontal_line(
        &self,
        x: u32,
        y: u32,
        len: u32,
        color: impl Into<Color>,
    ) -> FbResult<()> {
        self.table.draw_horizontal_line(self.number, x, y, len, color.into())
    }

    /// Run of `len` pixels downwards.
    pub fn draw_vertical_line(
        &self,
        x: u32,
        y: u32,
        len: u32,
        color: impl Into<Color>,
    ) -> FbResult<()> {
        self.table.draw_vertical_line(self.number, x, y, len, color.into())
    }

    pub fn draw_circle(
        &self,
        xm: i32,
        ym: i32,
        radius: u32,
        color: impl Into<Color>,
    ) -> FbResult<()> {
        self.table.draw_circle(self.number, xm, ym, radius, color.into())
    }

    pub fn draw_ellipse(
        &self,
        xm: i32,
        ym: i32,
        a: u32,
        b: u32,
        color: impl Into<Color>,
    ) -> FbResult<()> {
        self.table.draw_ellipse(self.number, xm, ym, a, b, color.into())
    }

    pub fn fill(&self, color: impl Into<Color>) -> FbResult<()> {
        self.table.fill(self.number, color.into())
    }
}

/// Close one user of `number`; there is no caller left to report to, so a
/// failure is logged.
fn release(table: &DeviceTable, number: u8) {
    if let Err(err) = table.close(number) {
        log::warn!("closing framebuffer {} failed: {}", number, err);
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        release(&self.table, self.number);
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("number", &self.number)
            .field("xres", &self.xres)
            .field("yres", &self.yres)
            .field("depth", &self.depth)
            .finish()
    }
}
