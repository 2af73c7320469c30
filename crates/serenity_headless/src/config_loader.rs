//! Simulation config loading for headless runs.
//!
//! Reads [`SimConfig`] from RON files. Every section is optional thanks to
//! `#[serde(default)]`, so a file only needs the values it changes.

use std::fs;
use std::path::Path;

use serenity_core::config::SimConfig;
use serenity_core::error::GameError;
use thiserror::Error;

/// Errors that can occur when loading a config file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// File could not be read or written.
    #[error("IO error for '{path}': {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File is not valid RON for a config.
    #[error("Parse error in '{path}': {message}")]
    Parse {
        /// Offending path.
        path: String,
        /// Parser message.
        message: String,
    },
    /// Parsed, but the values are out of range.
    #[error("Invalid config in '{path}': {source}")]
    Invalid {
        /// Offending path.
        path: String,
        /// Validation failure.
        source: GameError,
    },
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigLoadError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: display.clone(),
        source,
    })?;

    let config: SimConfig = ron::from_str(&content).map_err(|e| ConfigLoadError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;
    config
        .validate()
        .map_err(|source| ConfigLoadError::Invalid { path: display, source })?;

    tracing::info!(path = %path.display(), "Loaded simulation config");
    Ok(config)
}

/// Load `path` if given, otherwise the built-in tuning.
pub fn load_or_default(path: Option<&Path>) -> Result<SimConfig, ConfigLoadError> {
    match path {
        Some(path) => load_config(path),
        None => {
            tracing::debug!("Using default simulation config");
            Ok(SimConfig::default())
        }
    }
}

/// Write `config` as pretty RON.
pub fn save_config(path: &Path, config: &SimConfig) -> Result<(), ConfigLoadError> {
    let display = path.display().to_string();
    let text = config.to_ron_string().map_err(|e| ConfigLoadError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigLoadError::Io {
            path: display.clone(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| ConfigLoadError::Io { path: display, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(run: (max_serenity: 150.0), abilities: (beam: (enabled: false)))").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.run.max_serenity, 150.0);
        assert!(!config.abilities.beam.enabled);
        assert_eq!(config.waves, SimConfig::default().waves);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.ron")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }

    #[test]
    fn test_bad_syntax() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(run: (max_serenity: ").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigLoadError::Parse { .. })));
    }

    #[test]
    fn test_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(playfield: (width: -5.0))").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigLoadError::Invalid { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configs").join("tuned.ron");
        let mut config = SimConfig::default();
        config.waves.base_count = 8.0;
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_default_when_no_path() {
        assert_eq!(load_or_default(None).unwrap(), SimConfig::default());
    }
}
