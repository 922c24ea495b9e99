//! Device table: the fixed registry of framebuffer slots.
//!
//! Every device number owns one [`DeviceSlot`] behind its own mutex, so
//! operations on different devices never contend. Opening is reference
//! counted: the first `open` acquires the device, negotiates its mode and
//! allocates the off-screen buffer; later opens only bump the count. The
//! matching last `close` tears everything down again.

use std::fmt;
use std::io;

use parking_lot::{Mutex, MutexGuard};

use crate::graphics::backend::{DeviceBackend, DeviceHandle};
use crate::graphics::error::{FbError, FbResult};
use crate::graphics::mode::{DisplayMode, PixelBuffer};

/// Number of framebuffer slots; device numbers are `0..MAX_FRAMEBUFFERS`.
pub const MAX_FRAMEBUFFERS: usize = 32;

/// State of one device number. Only reachable through the slot lock.
#[derive(Default)]
pub(crate) struct DeviceSlot {
    pub(crate) handle: Option<Box<dyn DeviceHandle>>,
    pub(crate) users: u32,
    pub(crate) mode: DisplayMode,
    pub(crate) buffer: Option<PixelBuffer>,
}

impl DeviceSlot {
    fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Drop the buffer, reset the mode and count, and release the device if
    /// one is still held. Leaves the slot closed even if the release fails.
    fn teardown(&mut self) -> io::Result<()> {
        self.buffer = None;
        self.mode = DisplayMode::default();
        self.users = 0;
        match self.handle.take() {
            Some(handle) => handle.close(),
            None => Ok(()),
        }
    }
}

/// The process-wide set of framebuffer slots.
pub struct DeviceTable {
    backend: Box<dyn DeviceBackend>,
    slots: Vec<Mutex<DeviceSlot>>,
}

impl DeviceTable {
    /// Create a table with every slot closed.
    pub fn new(backend: impl DeviceBackend + 'static) -> Self {
        Self::with_backend(Box::new(backend))
    }

    /// Create a table from an already boxed backend.
    pub fn with_backend(backend: Box<dyn DeviceBackend>) -> Self {
        let slots = (0..MAX_FRAMEBUFFERS)
            .map(|_| Mutex::new(DeviceSlot::default()))
            .collect();
        Self { backend, slots }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, number: u8) -> FbResult<&Mutex<DeviceSlot>> {
        self.slots
            .get(usize::from(number))
            .ok_or(FbError::InvalidDevice(number))
    }

    /// Lock slot `number` after validating the number.
    pub(crate) fn lock_slot(&self, number: u8) -> FbResult<MutexGuard<'_, DeviceSlot>> {
        Ok(self.slot(number)?.lock())
    }

    /// Lock slot `number` and require it to be open. The guard is released
    /// on every exit path of the caller.
    pub(crate) fn lock_open(&self, number: u8) -> FbResult<MutexGuard<'_, DeviceSlot>> {
        let slot = self.lock_slot(number)?;
        if !slot.is_open() {
            return Err(FbError::NotOpen(number));
        }
        Ok(slot)
    }

    /// Open device `number`, or add a user if it is already open.
    ///
    /// On failure nothing of the attempt survives: the device is released
    /// and the slot keeps its zeroed mode.
    pub fn open(&self, number: u8) -> FbResult<()> {
        let mut slot = self.lock_slot(number)?;

        if slot.is_open() {
            slot.users += 1;
            log::debug!("framebuffer {} shared, {} users", number, slot.users);
            return Ok(());
        }

        let mut handle = self.backend.open_device(number).map_err(|source| {
            log::debug!(
                "could not open {}: {}",
                self.backend.describe(number),
                source
            );
            FbError::DeviceUnavailable { number, source }
        })?;

        let (mode, buffer) = match negotiate(number, handle.as_mut()) {
            Ok(negotiated) => negotiated,
            Err(err) => {
                if let Err(close_err) = handle.close() {
                    log::warn!(
                        "releasing {} after failed open: {}",
                        self.backend.describe(number),
                        close_err
                    );
                }
                return Err(err);
            }
        };

        log::debug!(
            "opened {}: {}x{} ({}x{} virtual), {} bpp, {} byte buffer",
            self.backend.describe(number),
            mode.xres,
            mode.yres,
            mode.xres_virtual,
            mode.yres_virtual,
            mode.bits_per_pixel,
            mode.fb_size_b
        );

        slot.handle = Some(handle);
        slot.users = 1;
        slot.mode = mode;
        slot.buffer = Some(buffer);
        Ok(())
    }

    /// Release one user of device `number`. The last user tears the slot
    /// down and closes the device.
    ///
    /// Closing a slot that has no users is a caller bug: any leftover state
    /// is cleaned up, the slot stays closed and `InternalMismatch` is
    /// returned.
    pub fn close(&self, number: u8) -> FbResult<()> {
        let mut slot = self.lock_slot(number)?;

        match slot.users {
            0 => {
                log::warn!(
                    "Detected internal mismatch of library usage: framebuffer {} is already closed",
                    number
                );
                if let Err(err) = slot.teardown() {
                    log::warn!("cleanup of framebuffer {} failed: {}", number, err);
                }
                Err(FbError::InternalMismatch(number))
            }
            1 => {
                log::debug!("closing {}", self.backend.describe(number));
                slot.teardown().map_err(FbError::Io)
            }
            _ => {
                slot.users -= 1;
                log::debug!("framebuffer {} released, {} users", number, slot.users);
                Ok(())
            }
        }
    }

    /// Snapshot of the mode of device `number`. A closed slot reports the
    /// zeroed mode (`fb_size_b == 0`).
    pub fn query(&self, number: u8) -> FbResult<DisplayMode> {
        Ok(self.lock_slot(number)?.mode)
    }

    /// Whether device `number` is open. Out-of-range numbers are never open.
    #[must_use]
    pub fn is_open(&self, number: u8) -> bool {
        self.slot(number)
            .map(|slot| slot.lock().is_open())
            .unwrap_or(false)
    }

    /// Current number of users of device `number`.
    pub fn users(&self, number: u8) -> FbResult<u32> {
        Ok(self.lock_slot(number)?.users)
    }

    /// `(xres, yres, bits_per_pixel)` of device `number`. A slot that was
    /// never opened reports `InvalidDevice`.
    pub fn get_resolution(&self, number: u8) -> FbResult<(u32, u32, u32)> {
        let mode = self.query(number)?;
        if !mode.is_open() {
            return Err(FbError::InvalidDevice(number));
        }
        Ok(mode.resolution())
    }
}

fn negotiate(number: u8, handle: &mut dyn DeviceHandle) -> FbResult<(DisplayMode, PixelBuffer)> {
    let info = handle
        .query_mode()
        .map_err(|err| FbError::ModeQueryFailed {
            number,
            reason: err.to_string(),
        })?;
    let mode = DisplayMode::negotiate(number, &info)?;
    let buffer = PixelBuffer::allocate(&mode)?;
    Ok((mode, buffer))
}

impl fmt::Debug for DeviceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.lock().is_open())
            .map(|(number, _)| number)
            .collect();
        f.debug_struct("DeviceTable")
            .field("capacity", &self.slots.len())
            .field("open", &open)
            .finish()
    }
}
