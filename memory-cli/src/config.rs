//! Layered configuration: defaults, then an optional TOML file, then
//! environment overrides.

use anyhow::Context;
use memory_core::config::EngineConfig;
use std::path::Path;

/// Load configuration: a `--config` path if given, else the first of a
/// few conventional file names, else defaults; environment overrides
/// always apply last.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let base = match path {
        Some(path) => read_toml(path)?,
        None => {
            if let Ok(env_path) = std::env::var("HEBBIAN_CONFIG") {
                let p = Path::new(&env_path);
                if p.exists() {
                    read_toml(p)?
                } else {
                    tracing::warn!(path = %env_path, "HEBBIAN_CONFIG points to a missing file, using defaults");
                    EngineConfig::default()
                }
            } else {
                ["hebbian-memory.toml", ".hebbian-memory.toml"]
                    .iter()
                    .map(Path::new)
                    .find(|p| p.exists())
                    .map(|p| read_toml(p))
                    .transpose()?
                    .unwrap_or_default()
            }
        }
    };

    let resolved = base.apply_env_overrides();
    resolved.validate().context("invalid configuration")?;
    Ok(resolved)
}

fn read_toml(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config file: {}", path.display()))
}
