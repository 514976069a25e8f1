use std::path::{Path, PathBuf};

use crate::error::LabelError;
use crate::labels::LabelVocabulary;
use crate::settings::UserSettings;

// Default values for configuration
pub const DEFAULT_DATA_DIR: &str = "./layoutlmv3";
pub const DEFAULT_TRAIN_MANIFEST: &str = "train.txt";
pub const DEFAULT_TEST_MANIFEST: &str = "test.txt";
pub const DEFAULT_CLASS_LIST: &str = "class_list.txt";

/// Resolved, read-only configuration for one dataset instance.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,           // Root for manifests, class list and images
    pub train_manifest: String,      // File name under data_dir
    pub test_manifest: String,
    pub class_list: String,
    pub labels: LabelVocabulary,
}

impl DatasetConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            train_manifest: DEFAULT_TRAIN_MANIFEST.to_string(),
            test_manifest: DEFAULT_TEST_MANIFEST.to_string(),
            class_list: DEFAULT_CLASS_LIST.to_string(),
            labels: LabelVocabulary::default(),
        }
    }

    pub fn from_settings(settings: &UserSettings) -> Result<Self, LabelError> {
        let labels = match &settings.labels {
            Some(names) => LabelVocabulary::new(names.iter().cloned())?,
            None => LabelVocabulary::default(),
        };

        Ok(Self {
            data_dir: PathBuf::from(&settings.data_dir),
            train_manifest: settings.train_manifest.clone(),
            test_manifest: settings.test_manifest.clone(),
            class_list: settings.class_list.clone(),
            labels,
        })
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn class_list_path(&self) -> PathBuf {
        self.data_dir.join(&self.class_list)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}
