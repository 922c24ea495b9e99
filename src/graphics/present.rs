//! Presenting the off-screen buffer.
//!
//! There is one buffer per device. A flush writes it to the start of the
//! device while the slot lock is held, so no draw call can interleave with
//! the transfer; drawing afterwards continues on the same content.

use crate::graphics::error::{FbError, FbResult};
use crate::graphics::table::DeviceTable;

impl DeviceTable {
    /// Write the whole off-screen buffer of device `number` to the device.
    ///
    /// A short write is reported as `ShortWrite`, never retried.
    pub fn flush(&self, number: u8) -> FbResult<()> {
        let mut slot = self.lock_open(number)?;
        let slot = &mut *slot;

        let (Some(handle), Some(buffer)) = (slot.handle.as_mut(), slot.buffer.as_ref()) else {
            return Err(FbError::NotOpen(number));
        };

        let bytes = buffer.as_bytes();
        let written = handle.write_bytes(0, bytes)?;
        log::trace!("flushed {} of {} bytes to framebuffer {}", written, bytes.len(), number);

        if written != bytes.len() {
            return Err(FbError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }
}
