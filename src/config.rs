use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("ROLLCALL_CONFIG_PATH").unwrap_or("/usr/local/etc/rollcall/config.toml"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum descriptor distance accepted as a match.
    pub threshold: f32,
    /// Collapse repeated same-day check-ins into one event.
    pub dedup_same_day: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            dedup_same_day: false,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = load_config(Some(Path::new("/nonexistent/rollcall.toml"))).unwrap();
        assert_eq!(cfg.threshold, 0.6);
        assert!(!cfg.dedup_same_day);
    }

    #[test]
    fn test_round_trip() {
        let dir = std::env::temp_dir().join(format!("rollcall-cfg-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");
        let cfg = Config {
            threshold: 0.45,
            dedup_same_day: true,
        };
        save_config(&cfg, Some(&path)).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.threshold, 0.45);
        assert!(loaded.dedup_same_day);
        std::fs::remove_dir_all(&dir).ok();
    }
}
