//! In-process framebuffer backend.
//!
//! Each configured [`MemoryScreen`] owns a block of "video memory" that
//! flushes land in. Screens are cheap to clone and clones share state, so a
//! caller can keep one to inspect what the device table wrote. Faults (a
//! failing mode query, short writes) can be injected per screen.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DeviceBackend, DeviceHandle, ScreenInfo};
use crate::graphics::mode::MAX_BUFFER_BYTES;

/// One simulated framebuffer device.
#[derive(Debug, Clone)]
pub struct MemoryScreen {
    info: ScreenInfo,
    video: Arc<Mutex<Vec<u8>>>,
    fail_mode_query: bool,
    write_limit: Option<usize>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryScreen {
    /// A screen reporting `info`, with video memory sized for its virtual
    /// resolution. Modes larger than [`MAX_BUFFER_BYTES`] get no video
    /// memory; no device table can open them anyway.
    #[must_use]
    pub fn new(info: ScreenInfo) -> Self {
        let size = (info.xres_virtual as usize)
            .checked_mul(info.yres_virtual as usize)
            .and_then(|pixels| pixels.checked_mul(info.bits_per_pixel as usize / 8))
            .filter(|&size| size <= MAX_BUFFER_BYTES)
            .unwrap_or(0);

        Self {
            info,
            video: Arc::new(Mutex::new(vec![0u8; size])),
            fail_mode_query: false,
            write_limit: None,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every mode query on this screen fail.
    #[must_use]
    pub fn failing_mode_query(mut self) -> Self {
        self.fail_mode_query = true;
        self
    }

    /// Cap the number of bytes a single write may transfer.
    #[must_use]
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Copy of the current video memory.
    #[must_use]
    pub fn video_memory(&self) -> Vec<u8> {
        self.video.lock().clone()
    }

    /// Number of successful opens so far.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of closes so far.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of write calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether a handle to this screen is currently held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.open_count() > self.close_count()
    }
}

/// Backend serving [`MemoryScreen`]s by device number.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    screens: Mutex<HashMap<u8, MemoryScreen>>,
}

impl MemoryBackend {
    /// A backend with no screens; every open fails until one is added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryBackend::add_screen`].
    #[must_use]
    pub fn with_screen(self, number: u8, screen: MemoryScreen) -> Self {
        self.add_screen(number, screen);
        self
    }

    /// Attach `screen` as device `number`, replacing any previous one.
    pub fn add_screen(&self, number: u8, screen: MemoryScreen) {
        self.screens.lock().insert(number, screen);
    }

    /// Shared view of the screen behind device `number`.
    #[must_use]
    pub fn screen(&self, number: u8) -> Option<MemoryScreen> {
        self.screens.lock().get(&number).cloned()
    }
}

impl DeviceBackend for MemoryBackend {
    fn open_device(&self, number: u8) -> io::Result<Box<dyn DeviceHandle>> {
        let screen = self.screen(number).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no memory screen for device {}", number),
            )
        })?;
        screen.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle { screen }))
    }

    fn describe(&self, number: u8) -> String {
        format!("memory:fb{}", number)
    }
}

struct MemoryHandle {
    screen: MemoryScreen,
}

impl DeviceHandle for MemoryHandle {
    fn query_mode(&mut self) -> io::Result<ScreenInfo> {
        if self.screen.fail_mode_query {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a framebuffer device",
            ));
        }
        Ok(self.screen.info)
    }

    fn write_bytes(&mut self, offset: u64, data: &[u8]) -> io::Result<usize> {
        self.screen.writes.fetch_add(1, Ordering::SeqCst);

        let mut video = self.screen.video.lock();
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        if start > video.len() {
            return Ok(0);
        }

        let mut count = data.len().min(video.len() - start);
        if let Some(limit) = self.screen.write_limit {
            count = count.min(limit);
        }
        video[start..start + count].copy_from_slice(&data[..count]);
        Ok(count)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        self.screen.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_unknown_device_fails() {
        let backend = MemoryBackend::new();
        let err = backend.open_device(3).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_clones_share_video_memory() {
        let screen = MemoryScreen::new(ScreenInfo::new(2, 2, 32));
        let backend = MemoryBackend::new().with_screen(0, screen.clone());

        let mut handle = backend.open_device(0).unwrap();
        assert_eq!(handle.write_bytes(4, &[1, 2, 3, 4]).unwrap(), 4);
        handle.close().unwrap();

        let video = screen.video_memory();
        assert_eq!(video.len(), 16);
        assert_eq!(&video[4..8], &[1, 2, 3, 4]);
        assert_eq!(screen.open_count(), 1);
        assert_eq!(screen.close_count(), 1);
        assert!(!screen.is_held());
    }

    #[test]
    fn test_write_limit_produces_short_write() {
        let screen = MemoryScreen::new(ScreenInfo::new(4, 1, 16)).with_write_limit(3);
        let backend = MemoryBackend::new().with_screen(1, screen);

        let mut handle = backend.open_device(1).unwrap();
        assert_eq!(handle.write_bytes(0, &[9; 8]).unwrap(), 3);
    }

    #[test]
    fn test_failing_mode_query() {
        let screen = MemoryScreen::new(ScreenInfo::new(4, 4, 16)).failing_mode_query();
        let backend = MemoryBackend::new().with_screen(0, screen);

        let mut handle = backend.open_device(0).unwrap();
        assert!(handle.query_mode().is_err());
    }
}
