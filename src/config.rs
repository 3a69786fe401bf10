use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::texts::Difficulty;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to write config to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to serialize config")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub show_errors: bool,
    pub sound_enabled: bool,
    pub username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            show_errors: true,
            sound_enabled: true,
            username: None,
        }
    }
}

/// Command line choices layered over the stored config
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub difficulty: Option<Difficulty>,
    pub hide_errors: bool,
    pub mute: bool,
    pub username: Option<String>,
}

impl Config {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(difficulty) = overrides.difficulty {
            self.difficulty = difficulty;
        }
        if overrides.hide_errors {
            self.show_errors = false;
        }
        if overrides.mute {
            self.sound_enabled = false;
        }
        if let Some(username) = overrides.username.filter(|u| !u.trim().is_empty()) {
            self.username = Some(username.trim().to_string());
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable config falls back to defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring invalid config file");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(cfg)?;
        let write = |path: &Path| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &data)
        };
        write(&self.path).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
