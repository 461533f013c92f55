//! Settings: command-line arguments layered over `config.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::theme::DEFAULT_THEME;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TITLE: &str = "Menu Admin";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "menu-admin", about = "Terminal admin client for a hierarchical menu service")]
pub struct Args {
    /// Backend base URL (e.g. http://localhost:3000)
    #[arg(long, env = "MENU_ADMIN_BACKEND_URL")]
    pub base_url: Option<String>,

    /// Path to the config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Colour preset
    #[arg(long)]
    pub theme: Option<String>,

    /// Where to write the log
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Reads `path`, writing the defaults there first if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let parsed = serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(parsed)
        } else {
            let default = Self::default_data();
            default.save(path)?;
            Ok(default)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn default_data() -> Self {
        ConfigFile {
            base_url: Some(DEFAULT_BASE_URL.into()),
            title: Some(DEFAULT_TITLE.into()),
            theme: Some(DEFAULT_THEME.into()),
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        }
    }
}

pub struct AppPaths {
    pub config_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Unable to determine home directory")?;
        let config_dir = home.join(".local/menu-admin");
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating {}", config_dir.display()))?;
        Ok(Self {
            config_file: config_dir.join("config.json"),
            log_file: config_dir.join("menu-admin.log"),
        })
    }
}

/// Fully resolved settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub title: String,
    pub theme: String,
    pub request_timeout: Duration,
    pub log_file: PathBuf,
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self> {
        let paths = AppPaths::new()?;
        let config_path = args.config.clone().unwrap_or(paths.config_file);
        let file = ConfigFile::load(&config_path)?;
        Ok(Self::resolve(args, file, paths.log_file))
    }

    /// Arguments win over the file; the file wins over built-in defaults.
    pub fn resolve(args: &Args, file: ConfigFile, default_log: PathBuf) -> Self {
        let base_url = args
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Settings {
            base_url: normalize_base_url(&base_url),
            title: file.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            theme: args
                .theme
                .clone()
                .or(file.theme)
                .unwrap_or_else(|| DEFAULT_THEME.to_string()),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1),
            ),
            log_file: args.log_file.clone().unwrap_or(default_log),
        }
    }
}

/// Adds `http://` when no scheme is given and drops trailing slashes.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
