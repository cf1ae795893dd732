//! Runtime configuration
//!
//! Built-in defaults overlaid with an optional `config.json`, looked up in
//! the working directory first and the per-user config directory second.
//! Every key is optional; the chat API key is the only setting without a
//! usable default, and only chat and the agent fallback need it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::recorder::RecorderConfig;
use crate::session::SessionConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Page every recording starts on.
    pub start_url: String,
    /// Backing document for the process store.
    pub processes_file: PathBuf,
    pub headless: bool,
    /// Explicit browser executable; discovered if unset.
    pub browser_path: Option<PathBuf>,
    /// Parent directory for per-session profile directories.
    pub browser_user_data: Option<PathBuf>,
    /// Recorder polling interval (ms).
    pub poll_interval_ms: u64,
    /// OpenAI-compatible chat endpoint base URL.
    pub chat_endpoint: String,
    pub chat_api_key: Option<String>,
    pub chat_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: "https://www.baidu.com/index.htm".to_string(),
            processes_file: PathBuf::from("processes.json"),
            headless: false,
            browser_path: None,
            browser_user_data: None,
            poll_interval_ms: 500,
            chat_endpoint: "https://api.deepseek.com/v1".to_string(),
            chat_api_key: None,
            chat_model: "deepseek-chat".to_string(),
        }
    }
}

/// On-disk shape of `config.json`; all keys optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    start_url: Option<String>,
    processes_file: Option<PathBuf>,
    headless: Option<bool>,
    browser_path: Option<PathBuf>,
    browser_user_data: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    chat_endpoint: Option<String>,
    chat_api_key: Option<String>,
    chat_model: Option<String>,
}

impl Config {
    /// Load defaults overlaid with the first `config.json` found.
    pub fn load() -> Self {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    fn load_from(path: &Path) -> Self {
        let file = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<FileConfig>(&raw) {
                Ok(parsed) => {
                    log::debug!("loaded configuration from {}", path.display());
                    parsed
                }
                Err(e) => {
                    log::warn!("ignoring malformed {}: {}", path.display(), e);
                    FileConfig::default()
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {}", path.display(), e);
                FileConfig::default()
            }
        };

        let defaults = Self::default();
        Self {
            start_url: file.start_url.unwrap_or(defaults.start_url),
            processes_file: file.processes_file.unwrap_or(defaults.processes_file),
            headless: file.headless.unwrap_or(defaults.headless),
            browser_path: file.browser_path.or(defaults.browser_path),
            browser_user_data: file.browser_user_data.or(defaults.browser_user_data),
            poll_interval_ms: file.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            chat_endpoint: file.chat_endpoint.unwrap_or(defaults.chat_endpoint),
            chat_api_key: file.chat_api_key.or(defaults.chat_api_key),
            chat_model: file.chat_model.unwrap_or(defaults.chat_model),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            headless: self.headless,
            browser_path: self.browser_path.clone(),
            user_data_root: self.browser_user_data.clone(),
        }
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            start_url: self.start_url.clone(),
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("config.json");
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("flowpilot").join("config.json");
    user.exists().then_some(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_defaults_are_usable_without_a_file() {
        let config = Config::default();
        assert!(!config.start_url.is_empty());
        assert_eq!(config.processes_file, PathBuf::from("processes.json"));
        assert!(config.chat_api_key.is_none());
    }

    #[test]
    fn test_file_overlays_only_present_keys() {
        let path = std::env::temp_dir().join(format!("flowpilot-config-{}.json", Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"start_url": "https://intranet.example.com", "headless": true}"#,
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.start_url, "https://intranet.example.com");
        assert!(config.headless);
        // untouched keys keep their defaults
        assert_eq!(config.chat_model, "deepseek-chat");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("flowpilot-config-{}.json", Uuid::new_v4()));
        std::fs::write(&path, "{broken").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.start_url, Config::default().start_url);

        std::fs::remove_file(&path).ok();
    }
}
