use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use chrono::{
    format::{Item, StrftimeItems},
    NaiveTime,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// chrono format string used when listing alarms
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// playback volume in percent
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// name of the microphone to record from, the system default if unset
    #[serde(default)]
    pub input_device: Option<String>,
}

fn default_time_format() -> String {
    "%H:%M".to_string()
}

const fn default_volume() -> f32 {
    100.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            volume: default_volume(),
            input_device: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read or isn't valid config, including a
    /// `time_format` that can't show a time of day
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&config)?;
        check_time_format(&config.time_format)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file gives the defaults.
    ///
    /// # Errors
    /// if the file exists but can't be read or parsed
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// # Errors
    /// if the config directory or file can't be written
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    /// # Errors
    /// if there is no home directory to put the config in
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "voice_alarm")
            .ok_or(ConfigError::NoProjectDirs)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }
}

/// Rejects unknown specifiers and ones a bare time of day can't fill in,
/// like `%Y`. Either would make formatting fail.
fn check_time_format(format: &str) -> Result<(), ConfigError> {
    let known = StrftimeItems::new(format).all(|item| !matches!(item, Item::Error));
    let mut sample = String::new();
    if known && write!(sample, "{}", NaiveTime::MIN.format(format)).is_ok() {
        Ok(())
    } else {
        Err(ConfigError::TimeFormat(format.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            time_format: "%l:%M %p".to_string(),
            volume: 40.0,
            input_device: Some("USB Mic".to_string()),
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "volume = 55.0\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.volume, 55.0);
        assert_eq!(config.time_format, "%H:%M");
        assert_eq!(config.input_device, None);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::new());
        assert!(matches!(Config::load(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn unusable_time_format_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for format in ["%Q", "%Y-%m-%d %H:%M"] {
            std::fs::write(&path, format!("time_format = \"{format}\"\n")).unwrap();
            assert!(
                matches!(
                    Config::load_or_default(&path),
                    Err(ConfigError::TimeFormat(f)) if f == format
                ),
                "{format}"
            );
        }
        std::fs::write(&path, "time_format = \"%I:%M:%S %P\"\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().time_format, "%I:%M:%S %P");
    }

    #[test]
    fn bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "volume = \"loud\"\n").unwrap();
        assert!(matches!(
            Config::load_or_default(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
