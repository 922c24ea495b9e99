//! Framebuffer graphics: device table, off-screen rendering and presentation.
//!
//! A [`DeviceTable`] owns one slot per framebuffer number. Drawing calls
//! write into the slot's off-screen buffer; [`DeviceTable::flush`] copies it
//! to the device. [`Framebuffer`] wraps one open slot for scoped use and
//! [`ffi`] exposes the same operations through the C ABI.

pub mod backend;
pub mod color;
pub mod error;
pub mod ffi;
pub mod framebuffer;
pub mod mode;
pub mod present;
pub mod raster;
pub mod render;
pub mod table;


pub use backend::{
    DeviceBackend, DeviceHandle, LinuxFbBackend, MemoryBackend, MemoryScreen, ScreenInfo,
};
pub use color::{rgb, rgba, ChannelOrder, Color};
pub use error::{FbError, FbResult};
pub use framebuffer::Framebuffer;
pub use mode::{DisplayMode, PixelBuffer};
pub use table::{DeviceTable, MAX_FRAMEBUFFERS};
