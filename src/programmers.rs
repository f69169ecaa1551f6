//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use iceflash_core::transport::SpiTransport;

use crate::commands::CliError;

/// Programmer used when `-p` is not given
#[cfg(feature = "ft4222")]
pub const DEFAULT_PROGRAMMER: &str = "ft4222";
#[cfg(not(feature = "ft4222"))]
pub const DEFAULT_PROGRAMMER: &str = "dummy";

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "ft4222")]
    programmers.push(ProgrammerInfo {
        name: "ft4222",
        aliases: &["iceboard", "ft4222_spi"],
        description: "FT4222H USB SPI bridge on the IceBoard (VID:0403 PID:601c)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory flash emulator for testing",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!(" (aliases: {})", p.aliases.join(", ")));
        }
        help.push('\n');
    }

    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Open the named programmer and run `f` with it
///
/// The device is closed again when `f` returns.
pub fn with_programmer<F>(name: &str, f: F) -> Result<(), CliError>
where
    F: FnOnce(&mut dyn SpiTransport) -> Result<(), CliError>,
{
    let canonical_name = find_programmer(name).ok_or_else(|| unknown_programmer_error(name))?;

    match canonical_name {
        #[cfg(feature = "ft4222")]
        "ft4222" => {
            log::info!("Opening FT4222H programmer...");
            let mut master = iceflash_ft4222::Ft4222::open().map_err(|e| CliError::Open {
                programmer: "ft4222",
                source: Box::new(e),
            })?;
            f(&mut master)
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            log::info!("Using in-memory dummy flash");
            let mut master = iceflash_dummy::DummyFlash::new_default();
            f(&mut master)
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

fn unknown_programmer_error(name: &str) -> CliError {
    CliError::UnknownProgrammer {
        name: name.to_string(),
        help: programmer_help(),
    }
}
