pub mod holdings;
pub mod once;
pub mod rules;
pub mod watch;

use std::path::Path;

use anyhow::Context;

use crate::config::AppConfig;

pub(crate) fn load(path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::load_from(path).with_context(|| format!("failed to load config {}", path.display()))
}

pub(crate) fn save(cfg: &AppConfig, path: &Path) -> anyhow::Result<()> {
    cfg.save_to(path)
        .with_context(|| format!("failed to save config {}", path.display()))
}
