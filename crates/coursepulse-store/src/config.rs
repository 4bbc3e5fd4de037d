//! coursepulse configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use coursepulse_core::model::DEFAULT_RATING_SCALE_MAX;
use coursepulse_core::service::Policy;
use coursepulse_core::validation::{DEFAULT_ALLOWED_DOMAINS, SCALE_RANGE};

/// Environment variable overriding `data_dir`.
pub const DATA_DIR_ENV: &str = "COURSEPULSE_DATA_DIR";

/// Top-level coursepulse configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursepulseConfig {
    /// Directory holding the JSON collections.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Rating scale for forms started from a template.
    #[serde(default = "default_scale")]
    pub rating_scale_max: u8,
    /// Email domains accepted at registration. Empty accepts any domain.
    #[serde(default = "default_domains")]
    pub allowed_email_domains: Vec<String>,
    /// Seed the demo admin, faculty and student accounts.
    #[serde(default = "default_true")]
    pub seed_demo_accounts: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./coursepulse-data")
}
fn default_scale() -> u8 {
    DEFAULT_RATING_SCALE_MAX
}
fn default_domains() -> Vec<String> {
    DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect()
}
fn default_true() -> bool {
    true
}

impl Default for CoursepulseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rating_scale_max: default_scale(),
            allowed_email_domains: default_domains(),
            seed_demo_accounts: true,
        }
    }
}

impl CoursepulseConfig {
    /// The service policy these settings describe.
    pub fn policy(&self) -> Policy {
        Policy {
            allowed_email_domains: self
                .allowed_email_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            rating_scale_max: self.rating_scale_max,
            seed_demo_accounts: self.seed_demo_accounts,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `coursepulse.toml` in the current directory
/// 2. `~/.config/coursepulse/config.toml`
///
/// `COURSEPULSE_DATA_DIR` overrides the data directory.
pub fn load_config() -> Result<CoursepulseConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CoursepulseConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("coursepulse.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CoursepulseConfig::default(),
    };

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            config.data_dir = PathBuf::from(dir);
        }
    }

    Ok(config)
}

/// Parse and check a configuration document, expanding `${VAR}` references.
pub fn parse_config(content: &str) -> Result<CoursepulseConfig> {
    let mut config: CoursepulseConfig = toml::from_str(content)?;

    config.data_dir = PathBuf::from(resolve_env_vars(&config.data_dir.to_string_lossy()));
    config.allowed_email_domains = config
        .allowed_email_domains
        .iter()
        .map(|d| resolve_env_vars(d))
        .collect();

    if !SCALE_RANGE.contains(&config.rating_scale_max) {
        anyhow::bail!(
            "rating_scale_max must be between {} and {}, got {}",
            SCALE_RANGE.start(),
            SCALE_RANGE.end(),
            config.rating_scale_max
        );
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("coursepulse"))
}
