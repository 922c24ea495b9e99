use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::graphics::{Color, MAX_FRAMEBUFFERS};
use crate::logging::LogLevel;

/// Environment variable naming the directory holding the `fbN` device files.
pub const DEVICE_DIR_VAR: &str = "FBPRIMS_DEVICE_DIR";
/// Environment variable holding the log level (name or 0-6).
pub const LOG_LEVEL_VAR: &str = "FBPRIMS_LOG_LEVEL";

/// Runtime options for the library and the command-line tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Directory the device files are looked up in; device `n` is
    /// `<device_dir>/fb<n>`.
    pub device_dir: PathBuf,
    pub log_level: LogLevel,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from("/dev"),
            log_level: LogLevel::Warning,
        }
    }
}

impl Options {
    /// Path of the device file for `number`.
    pub fn device_path(&self, number: u8) -> PathBuf {
        self.device_dir.join(format!("fb{}", number))
    }
}

/// Load options from the process environment.
pub fn load_options() -> Result<Options> {
    load_options_from(|name| std::env::var(name).ok())
}

/// Load options from the environment, falling back to the defaults (with a
/// warning) when a variable is malformed.
pub fn load_options_or_default() -> Options {
    load_options().unwrap_or_else(|err| {
        log::warn!("ignoring framebuffer environment settings: {:#}", err);
        Options::default()
    })
}

/// Load options, reading variables through `lookup`.
pub fn load_options_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Options> {
    let mut options = Options::default();

    if let Some(dir) = lookup(DEVICE_DIR_VAR) {
        if dir.trim().is_empty() {
            anyhow::bail!("{} is set but empty", DEVICE_DIR_VAR);
        }
        options.device_dir = PathBuf::from(dir);
    }

    if let Some(level) = lookup(LOG_LEVEL_VAR) {
        options.log_level =
            parse_log_level(&level).with_context(|| format!("Invalid {}", LOG_LEVEL_VAR))?;
    }

    Ok(options)
}

/// Parse a device number in `0..MAX_FRAMEBUFFERS`.
pub fn parse_device_number(s: &str) -> Result<u8> {
    let number: u8 = s.trim().parse().context("Invalid framebuffer number")?;
    if usize::from(number) >= MAX_FRAMEBUFFERS {
        anyhow::bail!(
            "Framebuffer number must be between 0 and {}",
            MAX_FRAMEBUFFERS - 1
        );
    }
    Ok(number)
}

/// Parse a color given as `0xAARRGGBB`, `0xRRGGBB`, `#RRGGBB` or a decimal
/// value. Six-digit hex forms are made opaque.
pub fn parse_color(s: &str) -> Result<Color> {
    let s = s.trim();
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('#'));

    let value = match hex {
        Some(digits) => {
            let value = u32::from_str_radix(digits, 16).context("Invalid hex color")?;
            match digits.len() {
                6 => 0xFF00_0000 | value,
                8 => value,
                _ => anyhow::bail!("Hex colors need 6 or 8 digits"),
            }
        }
        None => s.parse().context("Invalid color value")?,
    };

    Ok(Color::from_value(value))
}

/// Parse a log level given by name (`warning`, `debug`, ...) or as 0-6.
pub fn parse_log_level(s: &str) -> Result<LogLevel> {
    let s = s.trim();
    if let Ok(level) = s.parse::<i32>() {
        if !(0..=6).contains(&level) {
            anyhow::bail!("Log level must be between 0 and 6");
        }
        return Ok(LogLevel::from_i32(level));
    }

    match s.to_ascii_lowercase().as_str() {
        "nothing" | "off" => Ok(LogLevel::Nothing),
        "user" => Ok(LogLevel::User),
        "error" => Ok(LogLevel::Error),
        "warning" | "warn" => Ok(LogLevel::Warning),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "all" | "trace" => Ok(LogLevel::All),
        _ => anyhow::bail!("Unknown log level '{}'", s),
    }
}
