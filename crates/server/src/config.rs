use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use skill_core::config::{DEFAULT_GROUP_SIZE, DEFAULT_PRODUCT_GROUP_SIZE};

pub const SETTINGS_FILE: &str = "skill.toml";
pub const ENV_PREFIX: &str = "SKILL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub group_size: usize,
    pub product_group_size: usize,
    pub templates_path: Option<PathBuf>,
    pub skill_version: String,
    pub seed_demo_catalog: bool,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/catalog.db".into(),
            group_size: DEFAULT_GROUP_SIZE,
            product_group_size: DEFAULT_PRODUCT_GROUP_SIZE,
            templates_path: None,
            skill_version: env!("CARGO_PKG_VERSION").into(),
            seed_demo_catalog: true,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Built-in defaults, then `skill.toml` if present, then `SKILL__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .with_context(|| format!("failed to read settings from '{}'", path.display()))?
        .try_deserialize::<Settings>()
        .context("invalid settings")?;
    Ok(settings)
}

/// Turns a bare file path into a sqlite url. `Storage::new` creates the file
/// and its directory.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw = raw_database_url.trim();
    if raw.is_empty() {
        return Settings::default().database_url;
    }
    if raw.contains("://") || raw.starts_with("sqlite::memory:") {
        return raw.to_string();
    }
    match raw.strip_prefix("sqlite:") {
        Some(path) => format!("sqlite:{}", path.replace('\\', "/")),
        None => format!("sqlite://{}", raw.replace('\\', "/")),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
