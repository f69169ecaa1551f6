//! Flash session: wake, erase, program, validate

use std::fs;
use std::path::Path;

use iceflash_core::flash::{FlashProgrammer, ProgramProgress, ProgramStats};
use iceflash_core::geometry::FlashGeometry;
use iceflash_core::transport::SpiTransport;

use super::{CliError, Stage, StageError};

/// Which optional stages to run
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Chip erase before programming
    pub erase: bool,
    /// Read the whole image back after programming
    pub validate: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            erase: true,
            validate: true,
        }
    }
}

/// Read the image file, rejecting empty files
///
/// Runs before any device is opened.
pub fn load_image(path: &Path) -> Result<Vec<u8>, CliError> {
    let data = fs::read(path).map_err(|source| CliError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    if data.is_empty() {
        return Err(CliError::EmptyImage(path.to_path_buf()));
    }
    log::info!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

/// Load the geometry file, or fall back to the built-in default
pub fn load_geometry(path: Option<&Path>) -> Result<FlashGeometry, CliError> {
    match path {
        Some(path) => {
            let geometry = FlashGeometry::from_toml_file(path)?;
            log::info!("Loaded geometry from {:?}", path);
            Ok(geometry)
        }
        None => Ok(FlashGeometry::default()),
    }
}

/// Run a complete session on `transport`
pub fn run(
    transport: &mut dyn SpiTransport,
    geometry: FlashGeometry,
    image: &[u8],
    options: SessionOptions,
    progress: &mut dyn ProgramProgress,
) -> Result<ProgramStats, CliError> {
    let at = |stage: Stage| move |source: iceflash_core::Error| StageError { stage, source };

    log::debug!("Geometry: {:?}", geometry);
    let mut programmer = FlashProgrammer::new(transport, geometry).map_err(at(Stage::Setup))?;

    programmer.wake_up().map_err(at(Stage::Wake))?;

    if options.erase {
        programmer
            .erase_chip_with_progress(progress)
            .map_err(at(Stage::Erase))?;
    } else {
        log::warn!("Skipping chip erase; the target area must already be erased");
    }

    let stats = programmer
        .program_with_progress(image, progress)
        .map_err(at(Stage::Program))?;

    if options.validate {
        programmer
            .validate_with_progress(image, progress)
            .map_err(at(Stage::Validate))?;
        log::info!("Validation passed");
    }

    Ok(stats)
}
