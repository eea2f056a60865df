use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DEVICE: &str = "/dev/ttyS0";
const DEFAULT_BAUD_RATE: u32 = 38400;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_device")]
    pub device: PathBuf,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub touch: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: DEFAULT_BAUD_RATE,
            name: None,
            touch: true,
        }
    }
}

fn default_device() -> PathBuf {
    PathBuf::from(DEFAULT_DEVICE)
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_true() -> bool {
    true
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    parse(&content, path)
}

fn parse(content: &str, path: &Path) -> Option<FileConfig> {
    match toml::from_str(content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("isdv4-pad.toml")];

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("isdv4-pad.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("", Path::new("test.toml")).unwrap();
        assert_eq!(config.device, PathBuf::from(DEFAULT_DEVICE));
        assert_eq!(config.baud_rate, 38400);
        assert!(config.touch);
        assert!(config.name.is_none());
    }

    #[test]
    fn fields_are_read() {
        let config = parse(
            "device = \"/dev/ttyS4\"\nbaud_rate = 19200\nname = \"WACf00c\"\ntouch = false\n",
            Path::new("test.toml"),
        )
        .unwrap();
        assert_eq!(config.device, PathBuf::from("/dev/ttyS4"));
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.name.as_deref(), Some("WACf00c"));
        assert!(!config.touch);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("speed = 19200\n", Path::new("test.toml")).is_none());
    }
}
