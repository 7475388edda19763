//! Layered config loading.
//!
//! Layers, later ones replacing whole sections of earlier ones:
//! 1. `$BANKIM_CONFIG_DIR/config.toml`, or `~/.config/bankim/config.toml`
//! 2. `bankim.toml` in the project directory
//!
//! Only the merged result is validated.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{BankimConfig, ConfigError, Result};

const USER_CONFIG_FILE: &str = "config.toml";
const PROJECT_CONFIG_FILE: &str = "bankim.toml";
const CONFIG_DIR_ENV: &str = "BANKIM_CONFIG_DIR";

/// A validated configuration plus the layers that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: BankimConfig,
    /// One message per unreadable or malformed layer.
    pub warnings: Vec<String>,
}

/// Load the user layer and the project layer from `project_dir` (or the
/// working directory).
///
/// Missing files are skipped silently and malformed ones with a warning.
/// Out-of-range values in the merged result are an error.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    let project = project_dir
        .unwrap_or_else(|| Path::new("."))
        .join(PROJECT_CONFIG_FILE);
    let layers: Vec<PathBuf> = xdg_config_dir()
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .into_iter()
        .chain([project])
        .collect();
    load_layers(&layers)
}

/// Parse one config file without validating it.
pub fn load_config_file(path: &Path) -> Result<BankimConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    BankimConfig::from_toml(&contents)
}

/// Directory holding the user config and logs.
///
/// `BANKIM_CONFIG_DIR` wins over the platform config directory.
pub fn xdg_config_dir() -> Option<PathBuf> {
    std::env::var_os(CONFIG_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|dir| dir.join("bankim")))
}

fn load_layers(paths: &[PathBuf]) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig::default();

    for path in paths.iter().filter(|path| path.is_file()) {
        match load_config_file(path) {
            Ok(layer) => {
                debug!(path = %path.display(), "Merging config layer");
                loaded.config.merge(layer);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping config layer");
                loaded
                    .warnings
                    .push(format!("Skipped {}: {e}", path.display()));
            }
        }
    }

    loaded.config.validate()?;
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", "[retry]\nmax_retries = 4\n");

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.retry().max_retries, 4);
    }

    #[test]
    fn test_load_config_file_errors() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));

        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", "this is not valid toml {{{{");
        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_layers_give_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = load_layers(&[dir.path().join("config.toml"), dir.path().join("bankim.toml")])
            .unwrap();

        assert!(loaded.config.retry.is_none());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_project_layer_replaces_user_sections() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let layers = [
            write(&user, "config.toml", "[retry]\nmax_retries = 5\n\n[cache]\nmax_size = 10\n"),
            write(&project, "bankim.toml", "[cache]\nmax_size = 25\n"),
        ];

        let loaded = load_layers(&layers).unwrap();
        assert_eq!(loaded.config.cache().max_size, 25);
        assert_eq!(loaded.config.retry().max_retries, 5);
    }

    #[test]
    fn test_malformed_layer_is_skipped_with_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let layers = [
            write(&user, "config.toml", "[retry]\nmax_retries = 2\n"),
            write(&project, "bankim.toml", "not valid toml {{{{"),
        ];

        let loaded = load_layers(&layers).unwrap();
        assert_eq!(loaded.config.retry().max_retries, 2);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("Skipped"));
    }

    #[test]
    fn test_merged_result_is_validated() {
        let dir = TempDir::new().unwrap();
        let layers = [write(
            &dir,
            "bankim.toml",
            "[session]\nwarning_time_ms = 500\ntimeout_time_ms = 100\n",
        )];

        let err = load_layers(&layers).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_later_layer_can_fix_invalid_section() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let layers = [
            write(&user, "config.toml", "[session]\nwarning_time_ms = 500\ntimeout_time_ms = 100\n"),
            write(&project, "bankim.toml", "[session]\nwarning_time_ms = 50\ntimeout_time_ms = 100\n"),
        ];

        let loaded = load_layers(&layers).unwrap();
        assert_eq!(loaded.config.session().warning_time_ms, 50);
    }
}
