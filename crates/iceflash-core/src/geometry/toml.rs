//! TOML geometry file parsing
//!
//! Every key is optional and falls back to the built-in default:
//!
//! ```toml
//! [geometry]
//! page_size = 256
//! sector_size = "4 KiB"
//! capacity = "16 MiB"
//! max_read_chunk = 0x8000
//! max_program_attempts = 5
//! ready_poll_interval_ms = 1
//! ready_poll_timeout_ms = 1000
//! chip_erase_timeout_ms = 200000
//! ```

use std::fs;
use std::path::Path;
use std::string::{String, ToString};
use std::format;

use super::FlashGeometry;
use crate::error::Error;

/// Errors that can occur when loading a geometry file
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The file could not be read
    #[error("failed to read geometry file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid geometry TOML
    #[error("failed to parse geometry file: {0}")]
    Parse(String),
    /// The parsed geometry violates an invariant
    #[error("{0}")]
    Invalid(Error),
}

/// TOML geometry file structure
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGeometryFile {
    #[serde(default)]
    geometry: TomlGeometry,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGeometry {
    #[serde(default, deserialize_with = "deserialize_size")]
    page_size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_size")]
    sector_size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_size")]
    capacity: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_size")]
    max_read_chunk: Option<u32>,
    max_program_attempts: Option<u32>,
    ready_poll_interval_ms: Option<u32>,
    ready_poll_timeout_ms: Option<u32>,
    chip_erase_timeout_ms: Option<u32>,
}

/// Deserialize a size that can be an integer or a string ("0x1000", "4 KiB")
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeOrStr {
        Int(u32),
        Str(String),
    }

    match SizeOrStr::deserialize(deserializer)? {
        SizeOrStr::Int(n) => Ok(Some(n)),
        SizeOrStr::Str(s) => parse_size(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse a size string like "16 MiB", "0x1000" or "4096"
fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex.trim(), 16).map_err(|e| format!("invalid hex: {}", e));
    }

    let s_lower = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s_lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s_lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else if let Some(n) = s_lower.strip_suffix('b') {
        (n.trim(), 1)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    let num: u32 = num_str.parse().map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size out of range: {}", s))
}

impl FlashGeometry {
    /// Load a geometry from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a geometry from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, GeometryError> {
        let file: TomlGeometryFile =
            ::toml::from_str(content).map_err(|e| GeometryError::Parse(e.to_string()))?;
        let g = file.geometry;
        let defaults = FlashGeometry::default();

        let geometry = FlashGeometry {
            page_size: g.page_size.unwrap_or(defaults.page_size),
            sector_size: g.sector_size.unwrap_or(defaults.sector_size),
            capacity: g.capacity.unwrap_or(defaults.capacity),
            max_read_chunk: g.max_read_chunk.unwrap_or(defaults.max_read_chunk),
            max_program_attempts: g
                .max_program_attempts
                .unwrap_or(defaults.max_program_attempts),
            ready_poll_interval_ms: g
                .ready_poll_interval_ms
                .unwrap_or(defaults.ready_poll_interval_ms),
            ready_poll_timeout_ms: g
                .ready_poll_timeout_ms
                .unwrap_or(defaults.ready_poll_timeout_ms),
            chip_erase_timeout_ms: g
                .chip_erase_timeout_ms
                .unwrap_or(defaults.chip_erase_timeout_ms),
        };

        geometry.validate().map_err(GeometryError::Invalid)?;
        Ok(geometry)
    }
}
