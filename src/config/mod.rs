use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Notewire";
const APP_NAME: &str = "notewire";

/// Fallback endpoint when `[remote] base_url` is absent or empty. The web
/// deployments this client talks to proxy `/api` to the real backend; a
/// terminal process has no such proxy, so the default points at a local
/// instance instead.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8787/api";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("NOTEWIRE_CONFIG").ok().map(PathBuf::from);
        let override_state = env::var("NOTEWIRE_STATE").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = override_state.unwrap_or_else(|| {
            project_dirs
                .state_dir()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| project_dirs.data_dir().join("state"))
        });
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteOptions,
    pub ui: UiOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteOptions {
    /// Base URL of the notes service. Empty means [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// Transport-level request timeout handed to the HTTP client.
    /// 0 disables it.
    pub request_timeout_ms: u64,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_ms: 30_000,
        }
    }
}

impl RemoteOptions {
    /// The endpoint every request is issued against, with any trailing
    /// slashes trimmed so path joining stays predictable.
    pub fn endpoint(&self) -> &str {
        let configured = self.base_url.trim();
        let base = if configured.is_empty() {
            DEFAULT_BASE_URL
        } else {
            configured
        };
        base.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.request_timeout_ms))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    /// Lines of note content shown under each list entry.
    pub preview_lines: u16,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self { preview_lines: 2 }
    }
}
