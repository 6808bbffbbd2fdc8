use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Settings for an [`Analysis`](crate::Analysis) run, usually read from a
/// `purity.toml`:
///
/// ```toml
/// diagnostic-note = "effects are checked in strict mode"
/// exclude = ["legacy_main"]
/// check-anonymous = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Attached to every reported mismatch
    pub diagnostic_note: Option<String>,
    /// Names of declarations whose bodies are not checked
    pub exclude: Vec<String>,
    /// Whether bodies of function literals are checked on their own
    pub check_anonymous: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            diagnostic_note: None,
            exclude: Vec::new(),
            check_anonymous: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        content.parse()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == name)
    }
}

impl FromStr for AnalysisConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
diagnostic-note = "strict mode"
exclude = ["legacy_main", "debug_dump"]
check-anonymous = false
"#;

        let config: AnalysisConfig = toml_str.parse().unwrap();
        assert_eq!(
            config,
            AnalysisConfig {
                diagnostic_note: Some("strict mode".to_string()),
                exclude: vec!["legacy_main".to_string(), "debug_dump".to_string()],
                check_anonymous: false,
            }
        );
        assert!(config.is_excluded("debug_dump"));
        assert!(!config.is_excluded("main"));
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: AnalysisConfig = "exclude = [\"a\"]".parse().unwrap();
        assert_eq!(config.diagnostic_note, None);
        assert!(config.check_anonymous);

        let empty: AnalysisConfig = "".parse().unwrap();
        assert_eq!(empty, AnalysisConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = "exclude = 3".parse::<AnalysisConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = AnalysisConfig::from_file("/nonexistent/purity.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
