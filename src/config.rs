use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::charts::Palette;
use crate::dataset::NameFix;

/// Where the dataset lives unless the config or `--url` says otherwise.
pub const DEFAULT_DATASET_URL: &str = "https://tinyurl.com/y822sfzy";

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// CSV source of the song dataset.
    pub dataset_url: String,
    /// Custom cache path for the downloaded CSV (overrides XDG default).
    pub cache_path: Option<PathBuf>,
    /// Ignore the cached CSV and download again.
    pub refresh: bool,
    pub server: ServerConfig,
    /// Initial rank range and scatter axes for new sessions.
    pub view: ViewConfig,
    pub palette: Palette,
    /// Explicit renames for names the source spells wrong.
    pub name_fixes: Vec<NameFix>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            cache_path: None,
            refresh: false,
            server: ServerConfig::default(),
            view: ViewConfig::default(),
            palette: Palette::default(),
            name_fixes: Vec::new(),
        }
    }
}

/// Dashboard server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Launch the default browser once the server is listening.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8501,
            open_browser: true,
        }
    }
}

/// Default view. Validated when a session is created, not here.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub start: usize,
    pub end: usize,
    pub x_axis: String,
    pub y_axis: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: 25,
            x_axis: "energy_%".into(),
            y_axis: "danceability_%".into(),
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/streamdash/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::from_toml(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve the dataset cache path: config > XDG cache directory.
    pub fn resolve_cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME).map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default dataset cache path using XDG cache directory.
pub fn default_cache_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.cache_dir().join("dataset.csv")
    } else {
        // Fallback: current directory
        PathBuf::from("streamdash-dataset.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let c = AppConfig::from_toml("").unwrap();
        assert_eq!(c.dataset_url, DEFAULT_DATASET_URL);
        assert_eq!(c.server.port, 8501);
        assert!(c.server.open_browser);
        assert_eq!((c.view.start, c.view.end), (0, 25));
        assert_eq!(c.palette, Palette::default());
        assert!(c.name_fixes.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let c = AppConfig::from_toml(
            r##"
            dataset_url = "http://localhost/songs.csv"

            [server]
            port = 9000

            [view]
            end = 50
            x_axis = "valence_%"

            [palette]
            active = "#1db954"

            [[name_fixes]]
            from = "Tit Me Pregunt�"
            to = "Tití Me Preguntó"
            "##,
        )
        .unwrap();

        assert_eq!(c.dataset_url, "http://localhost/songs.csv");
        assert_eq!(c.server.port, 9000);
        assert!(c.server.open_browser);
        assert_eq!((c.view.start, c.view.end), (0, 50));
        assert_eq!(c.view.x_axis, "valence_%");
        assert_eq!(c.view.y_axis, "danceability_%");
        assert_eq!(c.palette.active, "#1db954");
        assert_eq!(c.palette.dimmed, "lightgray");
        assert_eq!(c.name_fixes.len(), 1);
        assert_eq!(c.name_fixes[0].to, "Tití Me Preguntó");
    }

    #[test]
    fn test_bad_config_is_error() {
        assert!(AppConfig::from_toml("server = 3").is_err());
    }
}
