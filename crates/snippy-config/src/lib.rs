use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client configuration for snippy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub list: ListConfig,
}

/// Where the snippet service lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_list_path")]
    pub list_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Path the list view lives at, used for history entries
    #[serde(default = "default_view_path")]
    pub view_path: String,

    /// Consecutive page clamps allowed before settling as-is
    #[serde(default = "default_max_clamp_attempts")]
    pub max_clamp_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            list: ListConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            list_path: default_list_path(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            view_path: default_view_path(),
            max_clamp_attempts: default_max_clamp_attempts(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_list_path() -> String {
    "/api/v1/snippets".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("snippy/{}", env!("CARGO_PKG_VERSION"))
}

fn default_view_path() -> String {
    "/snippets".to_string()
}

fn default_max_clamp_attempts() -> u32 {
    2
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "snippy", "snippy") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.snippy/config.toml")
        }
    }
}
