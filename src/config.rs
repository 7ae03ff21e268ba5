//! Persistent session configuration model and storage.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::Error;
use crate::protocol::PlaybackMode;

/// Session state persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Id of the playlist that was current when state was last saved.
    #[serde(default)]
    pub current_playlist_id: Option<String>,
    /// Playback mode restored at startup.
    #[serde(default)]
    pub playback_mode: PlaybackMode,
}

/// Default location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .expect("Could not find config directory")
        .join("segue")
        .join("config.toml")
}

/// Loads the configuration, falling back to defaults when the file is
/// missing or unreadable. A malformed file is reported but never fatal.
pub fn load_from(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).unwrap_or_else(|e| {
            warn!("Malformed config at {:?}, using defaults: {}", path, e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_to(path: &Path, config: &Config) -> Result<(), Error> {
    let raw = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.playback_mode, PlaybackMode::Default);
    }

    #[test]
    fn test_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            current_playlist_id: Some("abc-123".to_string()),
            playback_mode: PlaybackMode::RepeatTrack,
        };
        save_to(&path, &config).expect("save");

        let restored = load_from(&path);
        assert_eq!(restored, config);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "playback_mode = 42").expect("write");

        assert_eq!(load_from(&path), Config::default());
    }
}
