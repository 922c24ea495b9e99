//! Framebuffer FFI layer - C ABI bindings.
//!
//! Every function takes a device number and returns an integer status:
//! `0` on success, `-2` when the device number is out of range and `-1` for
//! any other failure. `rust_fb_flush_buffer` only reports `0` or `-1`. The kind of the last failure on the calling thread is
//! available from [`rust_fb_last_error`].
//!
//! All calls go through one process-wide [`DeviceTable`]. It is created on
//! first use from the environment (see [`crate::config`]), or installed by
//! the embedder with [`install_device_table`] before the first call.
//!
//! # Exported Functions
//!
//! | Rust export                      | Purpose                               |
//! |----------------------------------|---------------------------------------|
//! | `rust_fb_init`                   | Create the device table (idempotent)  |
//! | `rust_fb_max_framebuffers`       | Number of device slots                |
//! | `rust_fb_open`                   | Open a device or add a user           |
//! | `rust_fb_close`                  | Release one user                      |
//! | `rust_fb_set_pixel`              | Set one pixel                         |
//! | `rust_fb_draw_line`              | Line between two points               |
//! | `rust_fb_draw_horizontal_line`   | Horizontal run                        |
//! | `rust_fb_draw_vertical_line`     | Vertical run                          |
//! | `rust_fb_draw_circle`            | Clipped circle outline                |
//! | `rust_fb_draw_ellipse`           | Clipped ellipse outline               |
//! | `rust_fb_fill`                   | Fill the whole buffer                 |
//! | `rust_fb_flush_buffer`           | Present the off-screen buffer         |
//! | `rust_fb_get_resolution`         | `(xres, yres, bits_per_pixel)`        |
//! | `rust_fb_last_error`             | Error code of the last call           |

use std::cell::Cell;
use std::ffi::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config;
use crate::graphics::backend::LinuxFbBackend;
use crate::graphics::color::Color;
use crate::graphics::error::{FbError, FbResult};
use crate::graphics::table::{DeviceTable, MAX_FRAMEBUFFERS};

/// Error code reported when a call panicked.
pub const FB_ERROR_PANIC: c_int = 100;

// ============================================================================
// Global device table
// ============================================================================

static TABLE: RwLock<Option<Arc<DeviceTable>>> = RwLock::new(None);

thread_local! {
    static LAST_ERROR: Cell<c_int> = const { Cell::new(0) };
}

/// The process-wide device table, created from the environment on first use.
pub fn device_table() -> Arc<DeviceTable> {
    if let Some(table) = TABLE.read().as_ref() {
        return Arc::clone(table);
    }

    let mut slot = TABLE.write();
    let table = slot.get_or_insert_with(|| {
        let options = config::load_options_or_default();
        log::debug!(
            "creating framebuffer table on {}",
            options.device_dir.display()
        );
        Arc::new(DeviceTable::new(LinuxFbBackend::new(options.device_dir)))
    });
    Arc::clone(table)
}

/// Replace the process-wide device table. Returns the previous one.
///
/// Meant to be called once during startup, before any device is opened
/// through the C surface.
pub fn install_device_table(table: Arc<DeviceTable>) -> Option<Arc<DeviceTable>> {
    TABLE.write().replace(table)
}

/// Drop the process-wide device table; the next call creates a fresh one.
pub fn reset_device_table() -> Option<Arc<DeviceTable>> {
    TABLE.write().take()
}

fn set_last_error(code: c_int) {
    LAST_ERROR.with(|last| last.set(code));
}

/// Run `op` against the global table and turn its outcome into a status.
fn call(name: &str, op: impl FnOnce(&DeviceTable) -> FbResult<()>) -> c_int {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let table = device_table();
        op(&table)
    }));

    match outcome {
        Ok(Ok(())) => {
            set_last_error(0);
            0
        }
        Ok(Err(err)) => {
            log::debug!("{}: {}", name, err);
            set_last_error(err.code());
            err.status()
        }
        Err(_) => {
            log::error!("{}: panicked", name);
            set_last_error(FB_ERROR_PANIC);
            -1
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Initialize logging and the device table from the environment.
///
/// Safe to call more than once; later calls do nothing. Returns 0.
#[no_mangle]
pub extern "C" fn rust_fb_init() -> c_int {
    catch_unwind(|| {
        let options = config::load_options_or_default();
        crate::logging::init(options.log_level);
        let _ = device_table();
        0
    })
    .unwrap_or(-1)
}

/// Number of device slots.
#[no_mangle]
pub extern "C" fn rust_fb_max_framebuffers() -> c_int {
    MAX_FRAMEBUFFERS as c_int
}

/// Open device `num`, or add a user if it is already open.
#[no_mangle]
pub extern "C" fn rust_fb_open(num: u8) -> c_int {
    call("rust_fb_open", |table| table.open(num))
}

/// Release one user of device `num`.
#[no_mangle]
pub extern "C" fn rust_fb_close(num: u8) -> c_int {
    call("rust_fb_close", |table| table.close(num))
}

// ============================================================================
// Drawing
// ============================================================================

#[no_mangle]
pub extern "C" fn rust_fb_set_pixel(num: u8, x: u32, y: u32, color: u32) -> c_int {
    call("rust_fb_set_pixel", |table| {
        table.set_pixel(num, x, y, Color::from_value(color))
    })
}

#[no_mangle]
pub extern "C" fn rust_fb_draw_line(
    num: u8,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    color: u32,
) -> c_int {
    call("rust_fb_draw_line", |table| {
        table.draw_line(num, x1, y1, x2, y2, Color::from_value(color))
    })
}

#[no_mangle]
pub extern "C" fn rust_fb_draw_horizontal_line(
    num: u8,
    x: u32,
    y: u32,
    len: u32,
    color: u32,
) -> c_int {
    call("rust_fb_draw_horizontal_line", |table| {
        table.draw_horizontal_line(num, x, y, len, Color::from_value(color))
    })
}

#[no_mangle]
pub extern "C" fn rust_fb_draw_vertical_line(
    num: u8,
    x: u32,
    y: u32,
    len: u32,
    color: u32,
) -> c_int {
    call("rust_fb_draw_vertical_line", |table| {
        table.draw_vertical_line(num, x, y, len, Color::from_value(color))
    })
}

/// Circle outline; the center may be off screen.
#[no_mangle]
pub extern "C" fn rust_fb_draw_circle(
    num: u8,
    xm: c_int,
    ym: c_int,
    radius: u32,
    color: u32,
) -> c_int {
    call("rust_fb_draw_circle", |table| {
        table.draw_circle(num, xm, ym, radius, Color::from_value(color))
    })
}

/// Ellipse outline with semi-axes `a` and `b`; the center may be off screen.
#[no_mangle]
pub extern "C" fn rust_fb_draw_ellipse(
    num: u8,
    xm: c_int,
    ym: c_int,
    a: u32,
    b: u32,
    color: u32,
) -> c_int {
    call("rust_fb_draw_ellipse", |table| {
        table.draw_ellipse(num, xm, ym, a, b, Color::from_value(color))
    })
}

#[no_mangle]
pub extern "C" fn rust_fb_fill(num: u8, color: u32) -> c_int {
    call("rust_fb_fill", |table| table.fill(num, Color::from_value(color)))
}

// ============================================================================
// Presentation and queries
// ============================================================================

/// Write the off-screen buffer of device `num` to the device.
///
/// Returns `0` or `-1`; an out-of-range number is reported as `-1` like
/// every other failure.
#[no_mangle]
pub extern "C" fn rust_fb_flush_buffer(num: u8) -> c_int {
    call("rust_fb_flush_buffer", |table| table.flush(num)).max(-1)
}

/// Store the resolution of device `num` through the out pointers.
///
/// # Safety
///
/// Each pointer must be null or valid for a `u32` write. Nothing is written
/// unless the call succeeds; a null pointer fails the call.
#[no_mangle]
pub unsafe extern "C" fn rust_fb_get_resolution(
    num: u8,
    xres: *mut u32,
    yres: *mut u32,
    bits_per_pixel: *mut u32,
) -> c_int {
    call("rust_fb_get_resolution", |table| {
        if xres.is_null() || yres.is_null() || bits_per_pixel.is_null() {
            return Err(FbError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "null resolution pointer",
            )));
        }
        let (x, y, bpp) = table.get_resolution(num)?;
        // SAFETY: checked for null above; validity is the caller's contract.
        unsafe {
            *xres = x;
            *yres = y;
            *bits_per_pixel = bpp;
        }
        Ok(())
    })
}

/// Error code of the last call made on this thread, `0` if it succeeded.
#[no_mangle]
pub extern "C" fn rust_fb_last_error() -> c_int {
    LAST_ERROR.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::backend::{MemoryBackend, MemoryScreen, ScreenInfo};
    use serial_test::serial;

    fn install(screen: &MemoryScreen) -> Arc<DeviceTable> {
        let table = Arc::new(DeviceTable::new(
            MemoryBackend::new().with_screen(0, screen.clone()),
        ));
        install_device_table(Arc::clone(&table));
        table
    }

    #[serial]
    #[test]
    fn test_open_status_codes() {
        let screen = MemoryScreen::new(ScreenInfo::new(8, 8, 32));
        install(&screen);

        assert_eq!(rust_fb_open(0), 0);
        assert_eq!(rust_fb_last_error(), 0);

        assert_eq!(rust_fb_open(32), -2);
        assert_eq!(rust_fb_last_error(), FbError::InvalidDevice(32).code());

        assert_eq!(rust_fb_open(1), -1);
        assert_eq!(rust_fb_last_error(), 2);

        assert_eq!(rust_fb_close(0), 0);
        assert_eq!(rust_fb_close(0), -1);
        assert_eq!(rust_fb_last_error(), FbError::InternalMismatch(0).code());
        reset_device_table();
    }

    #[serial]
    #[test]
    fn test_draw_and_flush() {
        let screen = MemoryScreen::new(ScreenInfo::new(4, 4, 32));
        let table = install(&screen);

        assert_eq!(rust_fb_open(0), 0);
        assert_eq!(rust_fb_fill(0, 0), 0);
        assert_eq!(rust_fb_set_pixel(0, 1, 0, 0x00FF_0000), 0);
        assert_eq!(rust_fb_draw_line(0, 0, 1, 3, 1, 0x0000_00FF), 0);
        assert_eq!(rust_fb_draw_horizontal_line(0, 0, 2, 4, 0x0000_FF00), 0);
        assert_eq!(rust_fb_draw_vertical_line(0, 3, 0, 4, 0x0000_FF00), 0);
        assert_eq!(rust_fb_draw_circle(0, -10, -10, 2, 0x00FF_FFFF), 0);
        assert_eq!(rust_fb_draw_ellipse(0, 1, 1, 1, 1, 0x00FF_FFFF), 0);
        assert_eq!(rust_fb_flush_buffer(0), 0);

        assert_eq!(screen.write_count(), 1);
        assert_eq!(table.get_pixel(0, 0, 2).unwrap(), 0x0000_FF00);
        assert_eq!(table.get_pixel(0, 3, 0).unwrap(), 0x0000_FF00);

        assert_eq!(rust_fb_close(0), 0);
        reset_device_table();
    }

    #[serial]
    #[test]
    fn test_drawing_errors() {
        let screen = MemoryScreen::new(ScreenInfo::new(4, 4, 16));
        install(&screen);

        assert_eq!(rust_fb_set_pixel(0, 0, 0, 0), -1);
        assert_eq!(rust_fb_last_error(), FbError::NotOpen(0).code());
        assert_eq!(rust_fb_flush_buffer(0), -1);
        assert_eq!(screen.write_count(), 0);

        assert_eq!(rust_fb_open(0), 0);
        assert_eq!(rust_fb_set_pixel(0, 4, 0, 0), -1);
        assert_eq!(
            rust_fb_last_error(),
            FbError::OutOfBounds { x: 4, y: 0 }.code()
        );
        assert_eq!(rust_fb_draw_horizontal_line(0, 0, 0, 0, 0), 0);
        assert_eq!(rust_fb_set_pixel(40, 0, 0, 0), -2);

        assert_eq!(rust_fb_flush_buffer(32), -1);
        assert_eq!(rust_fb_last_error(), FbError::InvalidDevice(32).code());
        assert_eq!(rust_fb_flush_buffer(255), -1);
        assert_eq!(screen.write_count(), 0);

        assert_eq!(rust_fb_close(0), 0);
        reset_device_table();
    }

    #[serial]
    #[test]
    fn test_get_resolution() {
        let screen = MemoryScreen::new(ScreenInfo::new(320, 200, 16));
        install(&screen);

        let (mut x, mut y, mut bpp) = (0u32, 0u32, 0u32);
        // Never opened reads as an invalid device.
        let rc = unsafe { rust_fb_get_resolution(0, &mut x, &mut y, &mut bpp) };
        assert_eq!(rc, -2);
        assert_eq!((x, y, bpp), (0, 0, 0));

        assert_eq!(rust_fb_open(0), 0);
        let rc = unsafe { rust_fb_get_resolution(0, &mut x, &mut y, &mut bpp) };
        assert_eq!(rc, 0);
        assert_eq!((x, y, bpp), (320, 200, 16));

        let rc = unsafe {
            rust_fb_get_resolution(0, std::ptr::null_mut(), &mut y, &mut bpp)
        };
        assert_eq!(rc, -1);

        let rc = unsafe { rust_fb_get_resolution(50, &mut x, &mut y, &mut bpp) };
        assert_eq!(rc, -2);

        assert_eq!(rust_fb_close(0), 0);
        reset_device_table();
    }

    #[serial]
    #[test]
    fn test_install_replaces_table() {
        let first = install(&MemoryScreen::new(ScreenInfo::new(2, 2, 16)));
        let second = Arc::new(DeviceTable::new(MemoryBackend::new()));
        let previous = install_device_table(Arc::clone(&second));

        assert!(Arc::ptr_eq(&previous.unwrap(), &first));
        assert!(Arc::ptr_eq(&device_table(), &second));
        assert_eq!(rust_fb_max_framebuffers(), 32);
        reset_device_table();
    }

    #[serial]
    #[test]
    fn test_init_is_idempotent() {
        let table = install(&MemoryScreen::new(ScreenInfo::new(2, 2, 16)));
        assert_eq!(rust_fb_init(), 0);
        assert_eq!(rust_fb_init(), 0);
        assert!(Arc::ptr_eq(&device_table(), &table));
        reset_device_table();
    }
}
