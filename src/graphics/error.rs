//! Framebuffer error type.

use std::io;

/// Errors reported by the device table, the renderer and the presenter.
#[derive(Debug, thiserror::Error)]
pub enum FbError {
    #[error("The framebuffer number {0} is not valid")]
    InvalidDevice(u8),

    #[error("Could not open framebuffer {number}: {source}")]
    DeviceUnavailable {
        number: u8,
        #[source]
        source: io::Error,
    },

    #[error("Could not read display information of framebuffer {number}: {reason}")]
    ModeQueryFailed { number: u8, reason: String },

    #[error("Unsupported color depth of {0} bits per pixel")]
    UnsupportedDepth(u32),

    #[error("Could not allocate offscreen buffer of {0} bytes")]
    OutOfMemory(usize),

    #[error("The framebuffer {0} is not opened")]
    NotOpen(u8),

    #[error("The coordinates ({x}, {y}) are not on the screen")]
    OutOfBounds { x: i64, y: i64 },

    #[error("Short write to framebuffer: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Framebuffer I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("The framebuffer {0} is already closed")]
    InternalMismatch(u8),
}

/// Result type for framebuffer operations.
pub type FbResult<T> = Result<T, FbError>;

impl FbError {
    /// Status code for the C surface: `-2` for an invalid device number,
    /// `-1` for every other failure.
    #[must_use]
    pub fn status(&self) -> i32 {
        match self {
            Self::InvalidDevice(_) => -2,
            _ => -1,
        }
    }

    /// Stable per-kind code, reported by `rust_fb_last_error`.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidDevice(_) => 1,
            Self::DeviceUnavailable { .. } => 2,
            Self::ModeQueryFailed { .. } => 3,
            Self::UnsupportedDepth(_) => 4,
            Self::OutOfMemory(_) => 5,
            Self::NotOpen(_) => 6,
            Self::OutOfBounds { .. } => 7,
            Self::ShortWrite { .. } | Self::Io(_) => 8,
            Self::InternalMismatch(_) => 9,
        }
    }

    /// Whether this is one of the I/O failure kinds (short write or OS error).
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::ShortWrite { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FbError::InvalidDevice(40).status(), -2);
        assert_eq!(FbError::NotOpen(1).status(), -1);
        assert_eq!(
            FbError::ShortWrite {
                written: 1,
                expected: 2
            }
            .status(),
            -1
        );
    }

    #[test]
    fn test_io_kinds_share_a_code() {
        let short = FbError::ShortWrite {
            written: 0,
            expected: 4,
        };
        let os = FbError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(short.code(), os.code());
        assert!(short.is_io());
        assert!(os.is_io());
        assert!(!FbError::NotOpen(0).is_io());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            FbError::InvalidDevice(32).to_string(),
            "The framebuffer number 32 is not valid"
        );
        assert_eq!(
            FbError::OutOfBounds { x: 5, y: -1 }.to_string(),
            "The coordinates (5, -1) are not on the screen"
        );
        assert_eq!(
            FbError::InternalMismatch(3).to_string(),
            "The framebuffer 3 is already closed"
        );
    }
}
