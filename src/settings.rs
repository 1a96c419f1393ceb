//! Repo-mapping settings forwarded to the policy under test.
//!
//! The settings file is the same JSON document the policy itself consumes:
//! a map from source registry prefixes to their replacements. The harness
//! parses it for two reasons: to reject obviously broken files before the
//! tool runs, and to predict which fixture images the policy should have
//! rewritten in its output.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::image::ImageRef;

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub repos: HashMap<String, String>,
}

/// Errors loading or validating a settings file. Infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file '{path}' is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl Settings {
    /// Load and validate settings, returning both the parsed form and the
    /// raw text that gets forwarded to the tool via `--settings-json`.
    pub fn load(path: &Path) -> Result<(Settings, String), SettingsError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: display.clone(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: display,
                source,
            })?;
        settings.validate().map_err(SettingsError::Invalid)?;
        Ok((settings, raw))
    }

    /// An empty map is fine (the check degrades to marker-only); empty
    /// source or destination strings are not.
    pub fn validate(&self) -> Result<(), String> {
        for (src, dest) in &self.repos {
            if src.is_empty() {
                return Err("repo mapping has an empty source prefix".to_string());
            }
            if dest.is_empty() {
                return Err(format!("repo mapping for '{src}' has an empty destination"));
            }
        }
        Ok(())
    }

    /// Rewrite one image reference, if any source prefix matches its
    /// canonical form.
    pub fn rewrite(&self, image: &str) -> Option<String> {
        ImageRef::parse(image).rewrite(&self.repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_repos_validate_ok() {
        let settings = Settings {
            repos: HashMap::new(),
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_source_or_destination_is_rejected() {
        let settings = Settings {
            repos: HashMap::from([(String::new(), "mirror".to_string())]),
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            repos: HashMap::from([("quay.io".to_string(), String::new())]),
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_returns_parsed_settings_and_raw_text() {
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        let body = r#"{"repos":{"quay.io":"quay.tencentcloudcr.com"}}"#;
        write!(tf, "{body}").unwrap();

        let (settings, raw) = Settings::load(tf.path()).unwrap();
        assert_eq!(raw, body);
        assert_eq!(
            settings.rewrite("quay.io/etcd/etcd:v3.5"),
            Some("quay.tencentcloudcr.com/etcd/etcd:v3.5".to_string())
        );
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        write!(tf, "{{not json").unwrap();
        assert!(matches!(
            Settings::load(tf.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            Settings::load(Path::new("/no/such/settings.json")),
            Err(SettingsError::Read { .. })
        ));
    }
}
