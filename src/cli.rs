//! CLI argument parsing

use crate::programmers;
use clap::Parser;
use std::path::PathBuf;

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser, Debug)]
#[command(name = "iceflash")]
#[command(author, version, about = "SPI NOR flash programmer for the IceBoard", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(short, long, default_value = programmers::DEFAULT_PROGRAMMER, help = programmer_help())]
    pub programmer: String,

    /// Flash geometry file (TOML format)
    #[arg(long)]
    pub geometry: Option<PathBuf>,

    /// Don't erase the chip before programming
    #[arg(long)]
    pub no_erase: bool,

    /// Don't read the image back after programming
    #[arg(long)]
    pub no_validate: bool,

    /// List supported programmers and exit
    #[arg(long)]
    pub list_programmers: bool,

    /// Image file to write at address 0
    #[arg(required_unless_present = "list_programmers")]
    pub image: Option<PathBuf>,
}

impl Cli {
    /// Default log filter for the requested verbosity
    ///
    /// `RUST_LOG` still takes precedence when set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["iceflash", "bitstream.bin"]).unwrap();
        assert_eq!(cli.image, Some(PathBuf::from("bitstream.bin")));
        assert_eq!(cli.programmer, programmers::DEFAULT_PROGRAMMER);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.no_erase);
        assert!(!cli.no_validate);
        assert!(cli.geometry.is_none());
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "iceflash",
            "-vv",
            "-p",
            "dummy",
            "--geometry",
            "w25q128.toml",
            "--no-erase",
            "--no-validate",
            "image.bin",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.programmer, "dummy");
        assert_eq!(cli.geometry, Some(PathBuf::from("w25q128.toml")));
        assert!(cli.no_erase);
        assert!(cli.no_validate);
    }

    #[test]
    fn test_verbosity_sets_log_filter() {
        for (args, filter) in [
            (&["iceflash", "image.bin"][..], "info"),
            (&["iceflash", "-v", "image.bin"][..], "debug"),
            (&["iceflash", "-vv", "image.bin"][..], "trace"),
            (&["iceflash", "-vvv", "image.bin"][..], "trace"),
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.log_filter(), filter);
        }
    }

    #[test]
    fn test_verbose_logger_enables_debug() {
        use log::{Level, Log, Metadata};

        let debug = Metadata::builder().level(Level::Debug).build();
        let trace = Metadata::builder().level(Level::Trace).build();

        let cli = Cli::try_parse_from(["iceflash", "-v", "image.bin"]).unwrap();
        let logger = env_logger::Builder::new()
            .parse_filters(cli.log_filter())
            .build();
        assert!(logger.enabled(&debug));
        assert!(!logger.enabled(&trace));

        let cli = Cli::try_parse_from(["iceflash", "image.bin"]).unwrap();
        let logger = env_logger::Builder::new()
            .parse_filters(cli.log_filter())
            .build();
        assert!(!logger.enabled(&debug));
    }

    #[test]
    fn test_image_required() {
        assert!(Cli::try_parse_from(["iceflash"]).is_err());
        let cli = Cli::try_parse_from(["iceflash", "--list-programmers"]).unwrap();
        assert!(cli.list_programmers);
        assert!(cli.image.is_none());
    }
}
