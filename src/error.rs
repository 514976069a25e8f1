use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors: anything that stops generation of a whole split.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("class list not found: {}", .0.display())]
    ClassListNotFound(PathBuf),

    #[error("invalid class list {}: line {line}: {message}", .path.display())]
    ClassListInvalid {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to serialize dataset info: {0}")]
    InfoSerialize(#[from] serde_yaml::Error),

    #[error("failed to write example {id}: {source}")]
    Write {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl DatasetError {
    /// Maps `NotFound` to `not_found`, everything else to `Io`.
    pub(crate) fn from_open(
        path: PathBuf,
        source: std::io::Error,
        not_found: fn(PathBuf) -> DatasetError,
    ) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            not_found(path)
        } else {
            DatasetError::Io { path, source }
        }
    }
}

/// Why a single manifest line produced no example.
///
/// These never abort generation; the record is reported and skipped.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("malformed record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to open image {}: {source}", .path.display())]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {source}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {} has zero width or height", .path.display())]
    EmptyImage { path: PathBuf },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("label vocabulary is empty")]
    EmptyVocabulary,

    #[error("duplicate label in vocabulary: {0}")]
    DuplicateLabel(String),

    #[error("unknown label: {0}")]
    UnknownLabel(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write settings {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}
