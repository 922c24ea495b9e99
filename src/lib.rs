// Linux framebuffer drawing library
// Device table, off-screen rendering and C ABI

pub mod cli;
pub mod config;
pub mod graphics;
pub mod logging;

pub use cli::Cli;
pub use config::Options;
pub use graphics::{Color, DeviceTable, FbError, FbResult, Framebuffer};
pub use logging::LogLevel;
