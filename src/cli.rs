use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{parse_color, parse_device_number, parse_log_level, Options};
use crate::graphics::{Color, Framebuffer};

/// Draw primitives on a Linux framebuffer device
#[derive(Parser, Debug)]
#[command(name = "fbdraw")]
#[command(version)]
#[command(about = "Draw pixels, lines, circles and ellipses on /dev/fbN", long_about = None)]
pub struct Cli {
    /// Framebuffer number (0-31)
    #[arg(short, long, value_name = "N", default_value = "0")]
    pub device: String,

    /// Directory holding the fbN device files
    #[arg(long, value_name = "DIR")]
    pub device_dir: Option<PathBuf>,

    /// Log level (nothing, user, error, warning, info, debug, all or 0-6)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// One drawing operation. Colors accept `0xAARRGGBB`, `0xRRGGBB`,
/// `#RRGGBB` or a decimal value.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print resolution and depth
    Info,
    /// Fill the whole screen
    Fill { color: String },
    /// Set one pixel
    Pixel { x: u32, y: u32, color: String },
    /// Line between two points
    Line {
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        color: String,
    },
    /// Horizontal run of LEN pixels
    Hline {
        x: u32,
        y: u32,
        len: u32,
        color: String,
    },
    /// Vertical run of LEN pixels
    Vline {
        x: u32,
        y: u32,
        len: u32,
        color: String,
    },
    /// Circle outline, clipped to the screen
    Circle {
        #[arg(allow_negative_numbers = true)]
        xm: i32,
        #[arg(allow_negative_numbers = true)]
        ym: i32,
        radius: u32,
        color: String,
    },
    /// Ellipse outline with semi-axes A and B, clipped to the screen
    Ellipse {
        #[arg(allow_negative_numbers = true)]
        xm: i32,
        #[arg(allow_negative_numbers = true)]
        ym: i32,
        a: u32,
        b: u32,
        color: String,
    },
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref dir) = self.device_dir {
            opts.device_dir = dir.clone();
        }

        if let Some(ref level) = self.log_level {
            opts.log_level = parse_log_level(level).context("Invalid log level")?;
        }

        Ok(opts)
    }

    /// The selected framebuffer number.
    pub fn device_number(&self) -> Result<u8> {
        parse_device_number(&self.device)
    }
}

impl Command {
    /// Whether this command changes the screen (and so needs a flush).
    pub fn draws(&self) -> bool {
        !matches!(self, Command::Info)
    }

    /// Run the command against `fb`. Drawing commands leave the result in
    /// the off-screen buffer; the caller flushes.
    pub fn apply(&self, fb: &Framebuffer) -> Result<()> {
        match self {
            Command::Info => {
                println!(
                    "fb{}: {}x{}, {} bpp",
                    fb.number(),
                    fb.xres(),
                    fb.yres(),
                    fb.depth()
                );
            }
            Command::Fill { color } => {
                fb.fill(color_arg(color)?)?;
            }
            Command::Pixel { x, y, color } => {
                fb.draw_pixel(*x, *y, color_arg(color)?)?;
            }
            Command::Line {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                fb.draw_line(*x1, *y1, *x2, *y2, color_arg(color)?)?;
            }
            Command::Hline { x, y, len, color } => {
                fb.draw_horizontal_line(*x, *y, *len, color_arg(color)?)?;
            }
            Command::Vline { x, y, len, color } => {
                fb.draw_vertical_line(*x, *y, *len, color_arg(color)?)?;
            }
            Command::Circle {
                xm,
                ym,
                radius,
                color,
            } => {
                fb.draw_circle(*xm, *ym, *radius, color_arg(color)?)?;
            }
            Command::Ellipse {
                xm,
                ym,
                a,
                b,
                color,
            } => {
                fb.draw_ellipse(*xm, *ym, *a, *b, color_arg(color)?)?;
            }
        }
        Ok(())
    }
}

fn color_arg(s: &str) -> Result<Color> {
    parse_color(s).with_context(|| format!("Invalid color '{}'", s))
}
