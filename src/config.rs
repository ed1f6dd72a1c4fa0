use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the serverless gateway endpoints.
    pub gateway_base_url: String,

    /// Path to the static lesson catalog JSON, fetched once per run.
    pub lessons_path: PathBuf,

    /// Energy regeneration polling period, seconds.
    pub energy_tick_secs: u64,

    /// Target language code for word translation lookups.
    pub translate_lang: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_base_url: "http://127.0.0.1:3000".to_string(),
            lessons_path: PathBuf::from("lessons.json"),
            energy_tick_secs: 30,
            translate_lang: "my".to_string(),
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("errorparrot")
        .join(CONFIG_FILE_NAME)
}

/// Load the app config, merging the persisted file over defaults and
/// applying environment overrides. Absent or corrupt files fall back
/// silently.
pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &std::path::Path) -> AppConfig {
    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Config: failed to parse {:?}: {}", path, e);
                AppConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            log::warn!("Config: failed to read {:?}: {}", path, e);
            AppConfig::default()
        }
    };

    if let Ok(url) = std::env::var("ERRORPARROT_GATEWAY_URL") {
        if !url.is_empty() {
            config.gateway_base_url = url;
        }
    }
    if let Ok(path) = std::env::var("ERRORPARROT_LESSONS") {
        if !path.is_empty() {
            config.lessons_path = PathBuf::from(path);
        }
    }
    config
}
