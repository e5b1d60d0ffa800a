//! Engine configuration file (TOML).
//!
//! Lookup order: `--config`, then `CONJ_CONFIG`, then `config/settings.toml`.
//! An explicitly named file must exist; the default path is optional and falls
//! back to `EngineConfig::default()`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::EngineConfig;
use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";
pub const CONFIG_ENV: &str = "CONJ_CONFIG";

/// Load the engine configuration (not yet validated).
pub fn load_engine_config(explicit: Option<&Path>) -> Result<EngineConfig, AppError> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let path = match named {
        Some(path) => {
            if !path.exists() {
                return Err(AppError::new(
                    2,
                    format!("Config file '{}' does not exist.", path.display()),
                ));
            }
            path
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !path.exists() {
                debug!("no config file, using defaults");
                return Ok(EngineConfig::default());
            }
            path
        }
    };

    debug!(path = %path.display(), "loading config");
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
    parse_engine_config(&contents)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
}

/// Parse TOML text; missing keys take their defaults.
pub fn parse_engine_config(text: &str) -> Result<EngineConfig, AppError> {
    toml::from_str(text).map_err(|e| AppError::new(2, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_engine_config(
            r#"
            verification_ratio = 0.6
            max_denominator = 720
            trial_order = ["exponential", "recurrence", "polynomial"]
            "#,
        )
        .unwrap();
        assert_eq!(config.verification_ratio, 0.6);
        assert_eq!(config.max_denominator, 720);
        assert_eq!(
            config.trial_order,
            vec![
                ModelKind::Exponential,
                ModelKind::LinearRecurrence,
                ModelKind::Polynomial
            ]
        );
        assert_eq!(config.max_poly_degree_to_test, EngineConfig::default().max_poly_degree_to_test);
    }

    #[test]
    fn unknown_keys_and_families_are_rejected() {
        assert!(parse_engine_config("verification_raito = 0.5").is_err());
        assert!(parse_engine_config("trial_order = [\"rational\"]").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(load_engine_config(Some(&missing)).unwrap_err().exit_code(), 2);

        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "epsilon = 1e-6\ntime_budget_ms = 500\n").unwrap();
        let config = load_engine_config(Some(&path)).unwrap();
        assert_eq!(config.epsilon, 1e-6);
        assert_eq!(config.time_budget_ms, Some(500));
    }
}
