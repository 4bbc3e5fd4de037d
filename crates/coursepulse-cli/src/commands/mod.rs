pub mod analytics;
pub mod forms;
pub mod init;
pub mod responses;
pub mod submit;
pub mod users;

use anyhow::{Context, Result};
use coursepulse_core::service::{FeedbackService, InitReport};
use coursepulse_store::config::{load_config_from, CoursepulseConfig};
use coursepulse_store::json_dir::JsonDirStore;

use crate::GlobalArgs;

/// Resolve configuration, applying the `--data-dir` override.
pub fn load_config(global: &GlobalArgs) -> Result<CoursepulseConfig> {
    let mut config = load_config_from(global.config.as_deref())?;
    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Open the data directory and bring it up to date.
pub fn open_service(global: &GlobalArgs) -> Result<FeedbackService<JsonDirStore>> {
    let (service, _) = open_service_with_report(global)?;
    Ok(service)
}

pub fn open_service_with_report(
    global: &GlobalArgs,
) -> Result<(FeedbackService<JsonDirStore>, InitReport)> {
    let config = load_config(global)?;
    let store = JsonDirStore::open(&config.data_dir)
        .with_context(|| format!("failed to open data directory: {}", config.data_dir.display()))?;
    let mut service = FeedbackService::new(store).with_policy(config.policy());
    let report = service
        .initialize()
        .context("failed to initialize the data directory")?;
    tracing::debug!(data_dir = %config.data_dir.display(), "service ready");
    Ok((service, report))
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
