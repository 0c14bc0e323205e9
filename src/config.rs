use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "LUNG_INSIGHT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Dashboard settings
// ---------------------------------------------------------------------------

/// Tunables for the dashboard.  Every field has a default, so a config file
/// only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Target label drawn as a pie chart.
    pub label_column: String,
    /// Numeric column drawn as a histogram.
    pub age_column: String,
    /// Columns never offered in the feature selector.  The label column is
    /// always excluded as well, whether or not it is listed here.
    pub excluded_features: Vec<String>,
    /// Must be at least 1.
    pub histogram_bins: usize,
    /// Rows shown by "Show raw data".
    pub preview_rows: usize,
    /// Count plots with more distinct values than this are refused.
    pub max_categories: usize,
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            label_column: "Level".to_string(),
            age_column: "Age".to_string(),
            excluded_features: vec!["Patient Id".to_string(), "Level".to_string()],
            histogram_bins: 20,
            preview_rows: 5,
            max_categories: 100,
            window_size: [1200.0, 900.0],
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.histogram_bins == 0 {
            return Err(ConfigError::Invalid(
                "histogram_bins must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Settings from `$LUNG_INSIGHT_CONFIG`, falling back to defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        let path = Path::new(&path);
        match Self::from_file(path) {
            Ok(cfg) => {
                log::info!("Loaded settings from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn is_excluded(&self, column: &str) -> bool {
        column == self.label_column || self.excluded_features.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = DashboardConfig::from_json_str(r#"{ "histogram_bins": 30 }"#).unwrap();
        assert_eq!(cfg.histogram_bins, 30);
        assert_eq!(cfg.label_column, "Level");
        assert!(cfg.is_excluded("Patient Id"));
        assert!(!cfg.is_excluded("Age"));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = DashboardConfig::from_json_str("{ histogram_bins: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "age_column": "age", "excluded_features": [] }}"#).unwrap();
        let cfg = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.age_column, "age");
        assert!(!cfg.is_excluded("Patient Id"));
        // Still excluded: it is the label column.
        assert!(cfg.is_excluded("Level"));

        let missing = DashboardConfig::from_file(Path::new("/nonexistent/lung.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn label_column_is_always_excluded() {
        let cfg = DashboardConfig::from_json_str(r#"{ "label_column": "Stage" }"#).unwrap();
        assert!(cfg.is_excluded("Stage"));
        assert!(cfg.is_excluded("Level"));
        assert!(!cfg.is_excluded("Age"));
    }

    #[test]
    fn zero_histogram_bins_is_rejected() {
        let err = DashboardConfig::from_json_str(r#"{ "histogram_bins": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("histogram_bins"));
    }
}
