//! Device backends.
//!
//! The device table never touches the operating system directly. It goes
//! through a [`DeviceBackend`], which opens devices by number and hands back a
//! [`DeviceHandle`] for mode queries, writes and the final close. The Linux
//! backend talks to `/dev/fbN`; the memory backend keeps everything in
//! process for headless use and tests.

pub mod linux;
pub mod memory;

use std::io;

pub use linux::LinuxFbBackend;
pub use memory::{MemoryBackend, MemoryScreen};

/// Mode information as reported by a device, before negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenInfo {
    /// Visible horizontal resolution.
    pub xres: u32,
    /// Visible vertical resolution.
    pub yres: u32,
    /// Virtual (buffer) horizontal resolution.
    pub xres_virtual: u32,
    /// Virtual (buffer) vertical resolution.
    pub yres_virtual: u32,
    /// Color depth.
    pub bits_per_pixel: u32,
    /// Bit offset of the red channel inside a pixel.
    pub red_offset: u32,
    /// Bit offset of the blue channel inside a pixel.
    pub blue_offset: u32,
}

impl ScreenInfo {
    /// A mode whose virtual resolution equals the visible one, with the
    /// conventional RGB channel offsets for the depth.
    #[must_use]
    pub const fn new(xres: u32, yres: u32, bits_per_pixel: u32) -> Self {
        let red_offset = match bits_per_pixel {
            16 => 11,
            32 => 16,
            _ => 0,
        };

        Self {
            xres,
            yres,
            xres_virtual: xres,
            yres_virtual: yres,
            bits_per_pixel,
            red_offset,
            blue_offset: 0,
        }
    }

    /// Override the virtual resolution.
    #[must_use]
    pub const fn with_virtual(mut self, xres_virtual: u32, yres_virtual: u32) -> Self {
        self.xres_virtual = xres_virtual;
        self.yres_virtual = yres_virtual;
        self
    }

    /// Override the red and blue channel offsets.
    #[must_use]
    pub const fn with_offsets(mut self, red_offset: u32, blue_offset: u32) -> Self {
        self.red_offset = red_offset;
        self.blue_offset = blue_offset;
        self
    }
}

/// Opens framebuffer devices by number.
pub trait DeviceBackend: Send + Sync {
    /// Open the device for read/write.
    fn open_device(&self, number: u8) -> io::Result<Box<dyn DeviceHandle>>;

    /// Human readable location of the device, used in log messages.
    fn describe(&self, number: u8) -> String;
}

/// An opened framebuffer device.
pub trait DeviceHandle: Send {
    /// Retrieve the negotiated resolution and depth.
    fn query_mode(&mut self) -> io::Result<ScreenInfo>;

    /// Write `data` at byte `offset` of the device. Returns the byte count
    /// actually written, which may be short.
    fn write_bytes(&mut self, offset: u64, data: &[u8]) -> io::Result<usize>;

    /// Release the device.
    fn close(self: Box<Self>) -> io::Result<()>;
}
