use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::text::{TextConfig, TextMode};

/// Time limits a session can be configured with, in seconds.
pub const TIME_LIMITS: [u32; 4] = [15, 30, 60, 120];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_limit: u32,
    pub word_count: usize,
    pub sentence_count: usize,
    pub text_mode: TextMode,
    pub custom_text: Option<String>,
    pub username: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit: 60,
            word_count: 50,
            sentence_count: 3,
            text_mode: TextMode::Words,
            custom_text: None,
            username: String::new(),
        }
    }
}

impl Config {
    pub fn text_config(&self) -> TextConfig {
        TextConfig {
            mode: self.text_mode,
            number_of_words: self.word_count,
            number_of_sentences: self.sentence_count,
            custom_text: self.custom_text.clone(),
        }
    }

    /// Copy with every value forced into its allowed range.
    pub fn normalized(mut self) -> Self {
        self.time_limit = snap_time_limit(self.time_limit);
        self
    }
}

/// Nearest allowed time limit; ties go to the shorter one.
pub fn snap_time_limit(secs: u32) -> u32 {
    TIME_LIMITS
        .iter()
        .copied()
        .min_by_key(|limit| limit.abs_diff(secs))
        .unwrap_or(60)
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("clackr_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let loaded = fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Config>(&bytes).ok());

        match loaded {
            Some(cfg) => cfg.normalized(),
            None => {
                tracing::debug!(target: "config", path = %self.path.display(), "using default config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
