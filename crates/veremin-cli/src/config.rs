use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use veremin_core::VereminConfig;

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("veremin")
        .join("config.toml")
}

pub(crate) fn parse_config(text: &str) -> Result<VereminConfig> {
    let config: VereminConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<VereminConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = parse_config(&text).with_context(|| format!("loading {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// An explicit path must load. The default path falls back to defaults when
/// absent but still fails on a broken file.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<VereminConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let path = config_path();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(VereminConfig::default());
    }
    read_config(&path)
}

pub(crate) fn default_config_toml() -> Result<String> {
    Ok(toml::to_string_pretty(&VereminConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veremin_core::PlaybackMode;

    #[test]
    fn test_default_toml_parses_back() {
        let text = default_config_toml().unwrap();
        let config = parse_config(&text).unwrap();
        assert_eq!(config.mode, PlaybackMode::Sequencer);
        assert_eq!(config.sequencer.gamut, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[sequencer]\ngamut = 0\n").is_err());
        assert!(parse_config("[tempo]\nbpm = \"fast\"\n").is_err());
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let path = Path::new("/nonexistent/veremin/config.toml");
        assert!(load_config(Some(path)).is_err());
    }

    #[test]
    fn test_config_path_ends_in_app_dir() {
        assert!(config_path().ends_with("veremin/config.toml"));
    }
}
