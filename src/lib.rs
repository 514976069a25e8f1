//! Streams annotated document-image manifests into normalized training
//! examples for layout-aware token classification models.
//!
//! ```no_run
//! use doclayout_dataset::{DatasetBuilder, DatasetConfig, LogObserver, Split};
//!
//! let builder = DatasetBuilder::new(DatasetConfig::new("./layoutlmv3"));
//! for item in builder.generate_examples(Split::Train, LogObserver)? {
//!     let (index, example) = item?;
//!     println!("{index}: {} tokens", example.tokens.len());
//! }
//! # Ok::<(), doclayout_dataset::DatasetError>(())
//! ```

pub mod bbox;
pub mod config;
pub mod dataset;
pub mod error;
pub mod example;
pub mod image_loader;
pub mod labels;
pub mod logging;
pub mod manifest;
pub mod observer;
pub mod record;
pub mod settings;
pub mod utils;
pub mod writer;

pub use bbox::{normalize_bbox, BoundingBox, ImageSize, NORMALIZED_GRID};
pub use config::DatasetConfig;
pub use dataset::{DatasetBuilder, DatasetInfo, Examples, RecordOutcome, Records, Split};
pub use error::{DatasetError, LabelError, SettingsError, SkipReason};
pub use example::Example;
pub use labels::{ClassList, LabelResolver, LabelVocabulary, NerTag};
pub use observer::{GenerationObserver, GenerationStats, LogObserver, RecordingObserver};
pub use settings::UserSettings;
