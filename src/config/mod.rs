pub mod types;

use crate::error::{ConfigError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub use types::{
    Config, ExecutionConfig, KnowledgeBaseConfig, OrchestrationConfig, OutputConfig,
    SmartBugsConfig, ToolsConfig,
};

const CONFIG_FILE_NAME: &str = ".sbo.toml";

/// Get the global config file path (~/.sbo.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (<dir>/.sbo.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration from file or use defaults.
///
/// An explicitly given file must exist and parse. Otherwise the local config in the current
/// directory is tried first, then the global one; a config file that fails to parse is
/// skipped with a warning.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParsingFailed(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    let candidates = std::env::current_dir()
        .ok()
        .map(|cwd| local_config_path(&cwd))
        .into_iter()
        .chain(global_config_path());

    for candidate in candidates {
        if let Some(config) = read_optional(&candidate) {
            return Ok(config);
        }
    }

    Ok(Config::default())
}

fn read_optional(path: &Path) -> Option<Config> {
    if !path.exists() {
        return None;
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };
    match toml::from_str(&content) {
        Ok(config) => {
            debug!("Loaded configuration from {}", path.display());
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring invalid configuration {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[orchestration]\nrerun_invoked_tools = true\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert!(config.orchestration.rerun_invoked_tools);
    }

    #[test]
    fn test_explicit_config_must_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[execution\nprocesses = ").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_optional_config_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = local_config_path(dir.path());
        fs::write(&path, "not toml at all [").unwrap();
        assert!(read_optional(&path).is_none());
        assert!(read_optional(&dir.path().join("missing.toml")).is_none());
    }
}
