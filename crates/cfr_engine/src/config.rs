use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{RecurrenceError, Result};

/// Knobs for trajectory analysis and scans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Walk depth for limits and precision
    pub depth: usize,
    /// Blind delta uses `depth * blind_delta_factor` as the reference depth
    pub blind_delta_factor: usize,
    /// Run trajectory scans on the rayon pool
    pub parallel: bool,
    /// Also check conservation of the backward steps at construction
    pub check_negatives: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            depth: 100,
            blind_delta_factor: 2,
            parallel: true,
            check_negatives: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| RecurrenceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a toml file; a missing or invalid file falls back to defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid config file, using defaults")
                }
            },
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot read config file, using defaults"),
        }
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RecurrenceError::Config(e.to_string()))?;
        let mut file = fs::File::create(path).map_err(|e| RecurrenceError::Config(e.to_string()))?;
        file.write_all(content.as_bytes())
            .map_err(|e| RecurrenceError::Config(e.to_string()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(RecurrenceError::Config("depth must be positive".to_string()));
        }
        if self.blind_delta_factor < 2 {
            return Err(RecurrenceError::Config(
                "blind_delta_factor must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Reference depth for blind delta
    pub fn reference_depth(&self) -> usize {
        self.depth * self.blind_delta_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("depth = 250").expect("valid toml");
        assert_eq!(config.depth, 250);
        assert_eq!(config.blind_delta_factor, 2);
        assert!(config.parallel);
        assert_eq!(config.reference_depth(), 500);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AnalysisConfig::from_toml_str("depth = 0").is_err());
        assert!(AnalysisConfig::from_toml_str("blind_delta_factor = 1").is_err());
        assert!(AnalysisConfig::from_toml_str("depth = \"many\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("cfr_config_{}.toml", std::process::id()));
        let config = AnalysisConfig {
            depth: 42,
            parallel: false,
            ..AnalysisConfig::default()
        };
        config.save(&path).expect("writable temp dir");
        assert_eq!(AnalysisConfig::load(&path), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_defaults() {
        let path = Path::new("/nonexistent/cfr_config.toml");
        assert_eq!(AnalysisConfig::load(path), AnalysisConfig::default());
    }
}
