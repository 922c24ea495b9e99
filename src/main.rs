use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use fbprims::cli::Cli;
use fbprims::config;
use fbprims::graphics::{DeviceTable, Framebuffer, LinuxFbBackend};
use fbprims::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = config::load_options().context("Invalid environment settings")?;
    let options = cli.merge_into_options(options)?;
    logging::init(options.log_level);

    let number = cli.device_number()?;
    let table = Arc::new(DeviceTable::new(LinuxFbBackend::new(&options.device_dir)));

    let fb = Framebuffer::open(table, number)
        .with_context(|| format!("Could not open {}", options.device_path(number).display()))?;
    log::info!(
        "fb{}: {}x{}, {} bpp",
        number,
        fb.xres(),
        fb.yres(),
        fb.depth()
    );

    cli.command.apply(&fb)?;

    if cli.command.draws() {
        fb.update().context("Could not present the frame")?;
    }

    Ok(())
}
