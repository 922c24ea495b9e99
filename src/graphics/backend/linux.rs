//! Linux framebuffer device backend (`/dev/fbN`).

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

use super::{DeviceBackend, DeviceHandle, ScreenInfo};

/// `FBIOGET_VSCREENINFO` from `<linux/fb.h>`.
const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;

/// Mirrors `struct fb_bitfield` in `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// Mirrors `struct fb_var_screeninfo` in `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

impl From<FbVarScreeninfo> for ScreenInfo {
    fn from(v: FbVarScreeninfo) -> Self {
        Self {
            xres: v.xres,
            yres: v.yres,
            xres_virtual: v.xres_virtual,
            yres_virtual: v.yres_virtual,
            bits_per_pixel: v.bits_per_pixel,
            red_offset: v.red.offset,
            blue_offset: v.blue.offset,
        }
    }
}

/// Opens `<device_dir>/fb<N>`.
#[derive(Debug, Clone)]
pub struct LinuxFbBackend {
    device_dir: PathBuf,
}

impl LinuxFbBackend {
    /// Backend rooted at `device_dir` (normally `/dev`).
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }

    /// Directory the device files are looked up in.
    #[must_use]
    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    /// Path of the device file for `number`.
    #[must_use]
    pub fn device_path(&self, number: u8) -> PathBuf {
        self.device_dir.join(format!("fb{}", number))
    }
}

impl Default for LinuxFbBackend {
    fn default() -> Self {
        Self::new("/dev")
    }
}

impl DeviceBackend for LinuxFbBackend {
    fn open_device(&self, number: u8) -> io::Result<Box<dyn DeviceHandle>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.device_path(number))?;
        Ok(Box::new(LinuxFbHandle { file }))
    }

    fn describe(&self, number: u8) -> String {
        self.device_path(number).display().to_string()
    }
}

struct LinuxFbHandle {
    file: File,
}

impl DeviceHandle for LinuxFbHandle {
    fn query_mode(&mut self) -> io::Result<ScreenInfo> {
        let mut vinfo = FbVarScreeninfo::default();
        // SAFETY: FBIOGET_VSCREENINFO fills a `struct fb_var_screeninfo`,
        // which `FbVarScreeninfo` mirrors field for field.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                FBIOGET_VSCREENINFO as _,
                &mut vinfo as *mut FbVarScreeninfo,
            )
        };
        if rc == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(vinfo.into())
    }

    fn write_bytes(&mut self, offset: u64, data: &[u8]) -> io::Result<usize> {
        self.file.write_at(data, offset)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let fd = self.file.into_raw_fd();
        // SAFETY: `fd` was just released from the owning `File`, so it is
        // open and closed exactly once here.
        if unsafe { libc::close(fd) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
