//! iceflash - SPI NOR flash programmer for the IceBoard
//!
//! Writes an image (typically an FPGA bitstream) to the SPI flash behind the
//! board's FT4222H USB bridge. A session wakes the chip, erases it, programs
//! the image sector by sector with read-back verification and a bounded
//! number of retries, then reads the whole image back once more.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::Cli;
use commands::flash::{self, SessionOptions};
use commands::{CliError, IndicatifProgress};

fn main() {
    let cli = Cli::parse();

    // Initialize logger; -v/-vv pick the default filter, RUST_LOG overrides it
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if cli.list_programmers {
        commands::list_programmers();
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    // Everything that can fail without hardware is checked before opening it
    let Some(image_path) = cli.image.as_deref() else {
        return Ok(());
    };
    let image = flash::load_image(image_path)?;
    let geometry = flash::load_geometry(cli.geometry.as_deref())?;

    let options = SessionOptions {
        erase: !cli.no_erase,
        validate: !cli.no_validate,
    };

    programmers::with_programmer(&cli.programmer, |transport| {
        let mut progress = IndicatifProgress::new();
        match flash::run(transport, geometry, &image, options, &mut progress) {
            Ok(_) => {
                progress.finish("Done");
                println!("Flash programmed successfully");
                Ok(())
            }
            Err(e) => {
                progress.abandon();
                Err(e)
            }
        }
    })
}
