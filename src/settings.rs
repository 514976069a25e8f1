use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info};

use crate::config::{
    DEFAULT_CLASS_LIST, DEFAULT_DATA_DIR, DEFAULT_TEST_MANIFEST, DEFAULT_TRAIN_MANIFEST,
};
use crate::error::SettingsError;

/// User settings loaded from YAML. Every field has a default, so an empty
/// file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Directory holding the manifests, class list and images
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_train_manifest")]
    pub train_manifest: String,

    #[serde(default = "default_test_manifest")]
    pub test_manifest: String,

    #[serde(default = "default_class_list")]
    pub class_list: String,

    /// Replaces the built-in entity vocabulary when set
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_train_manifest() -> String {
    DEFAULT_TRAIN_MANIFEST.to_string()
}

fn default_test_manifest() -> String {
    DEFAULT_TEST_MANIFEST.to_string()
}

fn default_class_list() -> String {
    DEFAULT_CLASS_LIST.to_string()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            train_manifest: default_train_manifest(),
            test_manifest: default_test_manifest(),
            class_list: default_class_list(),
            labels: None,
        }
    }
}

impl UserSettings {
    /// On Linux: ~/.config/doclayout-dataset/settings.yaml
    /// On macOS: ~/Library/Application Support/doclayout-dataset/settings.yaml
    pub fn settings_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        config_dir.join("doclayout-dataset").join("settings.yaml")
    }

    /// Load settings. An explicit path must exist; a missing file at the
    /// default location means defaults.
    pub fn load(custom_path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match custom_path {
            Some(p) => {
                info!("Using custom settings path: {}", p.display());
                p.to_path_buf()
            }
            None => {
                let path = Self::settings_path();
                if !path.exists() {
                    debug!("Settings file not found at {:?}, using defaults", path);
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .map_err(|source| SettingsError::Read { path: path.clone(), source })?;
        let settings = Self::from_yaml(&contents)
            .map_err(|source| SettingsError::Parse { path: path.clone(), source })?;

        info!("Loaded settings from {:?}", path);
        debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // serde_yaml reads an empty document as null
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Write these settings as a commented YAML file. Refuses to overwrite
    /// unless `force` is set.
    pub fn save(&self, path: &Path, force: bool) -> Result<(), SettingsError> {
        if path.exists() && !force {
            return Err(SettingsError::AlreadyExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|source| SettingsError::Write { path: path.to_path_buf(), source })?;
            }
        }

        let contents = self
            .to_yaml_with_comments()
            .map_err(|e| SettingsError::Write { path: path.to_path_buf(), source: e.into() })?;
        fs::write(path, contents)
            .map_err(|source| SettingsError::Write { path: path.to_path_buf(), source })?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    fn to_yaml_with_comments(&self) -> Result<String, serde_json::Error> {
        let labels_line = match &self.labels {
            Some(labels) => {
                let mut block = String::from("labels:\n");
                for label in labels {
                    block.push_str(&format!("  - {}\n", yaml_quoted(label)?));
                }
                block
            }
            None => "# labels:\n#   - \"employerName\"\n#   - \"OTHER\"\n".to_string(),
        };

        Ok(format!(
            r#"# doclayout-dataset settings
# Command-line flags override the values in this file.

# Directory containing the manifests, the class list and the images.
# Image paths in the manifests are relative to this directory.
data_dir: {}

# Manifest file names for each split (one JSON record per line)
train_manifest: {}
test_manifest: {}

# Two-column "code name" table mapping annotation codes to label names
class_list: {}

# Entity vocabulary, in class-index order. Leave commented out to use the
# built-in 16 W-2 labels.
{}"#,
            yaml_quoted(&self.data_dir)?,
            yaml_quoted(&self.train_manifest)?,
            yaml_quoted(&self.test_manifest)?,
            yaml_quoted(&self.class_list)?,
            labels_line,
        ))
    }
}

/// A JSON string is also a valid YAML double-quoted scalar.
fn yaml_quoted(value: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings = UserSettings::from_yaml("data_dir: /data/w2\n").unwrap();
        assert_eq!(settings.data_dir, "/data/w2");
        assert_eq!(settings.train_manifest, DEFAULT_TRAIN_MANIFEST);
        assert_eq!(settings.class_list, DEFAULT_CLASS_LIST);
        assert!(settings.labels.is_none());
        assert_eq!(UserSettings::from_yaml("").unwrap(), UserSettings::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(UserSettings::from_yaml("labels: 7\n").is_err());
    }

    #[test]
    fn test_saved_template_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");

        UserSettings::default().save(&path, false).unwrap();
        assert_eq!(UserSettings::load(Some(path.as_path())).unwrap(), UserSettings::default());

        let custom = UserSettings {
            data_dir: "/srv/w2".to_string(),
            labels: Some(vec!["name".to_string(), "OTHER".to_string()]),
            ..UserSettings::default()
        };
        assert!(matches!(
            custom.save(&path, false),
            Err(SettingsError::AlreadyExists(_))
        ));
        custom.save(&path, true).unwrap();
        assert_eq!(UserSettings::load(Some(path.as_path())).unwrap(), custom);
    }

    #[test]
    fn test_backslashes_and_quotes_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");

        let settings = UserSettings {
            data_dir: r"C:\new\data".to_string(),
            class_list: r"classes\d.txt".to_string(),
            labels: Some(vec![r#"say "hi""#.to_string(), "OTHER".to_string()]),
            ..UserSettings::default()
        };
        settings.save(&path, false).unwrap();

        let loaded = UserSettings::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.data_dir, "C:\\new\\data");
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = UserSettings::load(Some(dir.path().join("missing.yaml").as_path()));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
