mod cli;
mod file;

pub use cli::{Cli, Command};

use std::path::PathBuf;

use isdv4_pad::{BaudRate, SessionOptions};

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub device: PathBuf,
    pub baud_rate: u32,
    pub name: String,
    pub touch_enabled: bool,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        Self {
            device: cli.device.clone().unwrap_or(file_config.device),
            baud_rate: cli.baud_rate.unwrap_or(file_config.baud_rate),
            name: cli.name.clone().or(file_config.name).unwrap_or_default(),
            touch_enabled: !cli.no_touch && file_config.touch,
        }
    }

    pub fn session_options(&self) -> isdv4_pad::Result<SessionOptions> {
        Ok(SessionOptions {
            baud_rate: BaudRate::try_from(self.baud_rate)?,
            touch_enabled: self.touch_enabled,
        })
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.device.as_os_str().is_empty() {
            return Err("No serial device given");
        }
        if BaudRate::try_from(self.baud_rate).is_err() {
            return Err("Baud rate must be 19200 or 38400");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["isdv4-pad", "--config", "/nonexistent/isdv4-pad.toml"];
        argv.extend_from_slice(args);
        Config::load(&Cli::parse_from(argv))
    }

    #[test]
    fn cli_overrides() {
        let config = config(&["--device", "/dev/ttyUSB0", "--baud-rate", "19200", "--no-touch"]);
        assert_eq!(config.device, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(config.baud_rate, 19200);
        assert!(!config.touch_enabled);
        let options = config.session_options().unwrap();
        assert_eq!(options.baud_rate, BaudRate::B19200);
        assert!(!options.touch_enabled);
    }

    #[test]
    fn other_speeds_are_rejected() {
        let config = config(&["--device", "/dev/ttyS0", "--baud-rate", "9600"]);
        assert!(config.validate().is_err());
        assert!(config.session_options().is_err());
    }
}
