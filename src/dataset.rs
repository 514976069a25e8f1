/// Dataset builder and example generation
///
/// `DatasetBuilder` describes the dataset (info, splits) and opens a
/// streaming pass over one split. Two iterators are offered:
///
/// - `Records`: one typed `RecordOutcome` per manifest line, nothing logged.
/// - `Examples`: only the successful `(index, Example)` pairs; skips and
///   out-of-range boxes go to a `GenerationObserver`.
///
/// Both are lazy and single-pass: one manifest line and one decoded image
/// are alive at a time.
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::Serialize;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::bbox::{exceeds_grid, normalize_bboxes};
use crate::config::DatasetConfig;
use crate::error::{DatasetError, SkipReason};
use crate::example::Example;
use crate::image_loader::load_image;
use crate::labels::ClassList;
use crate::manifest::{ManifestReader, RawLine};
use crate::observer::{GenerationObserver, GenerationStats};
use crate::record::parse_record;
use crate::utils::timing::TimingStats;

pub const DATASET_NAME: &str = "EntityExtraction";
pub const DATASET_VERSION: &str = "1.0.0";
pub const DATASET_DESCRIPTION: &str =
    "Sample dataset for training a LayoutLMv3 model on custom annotated document images.";
pub const DATASET_CITATION: &str = "";
pub const DATASET_HOMEPAGE: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "test" => Ok(Split::Test),
            other => Err(format!("unknown split '{}', expected 'train' or 'test'", other)),
        }
    }
}

/// Type of one example field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    String,
    Int64,
    Sequence { of: Box<FeatureKind> },
    ClassLabel { names: Vec<String> },
    Image,
}

impl FeatureKind {
    fn sequence(of: FeatureKind) -> Self {
        FeatureKind::Sequence { of: Box::new(of) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub citation: String,
    pub homepage: String,
    pub features: Vec<Feature>,
}

/// Where the examples of one split come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitGenerator {
    pub split: Split,
    pub manifest: PathBuf,
    pub data_dir: PathBuf,
}

pub struct DatasetBuilder {
    config: DatasetConfig,
}

impl DatasetBuilder {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn info(&self) -> DatasetInfo {
        let feature = |name: &str, kind: FeatureKind| Feature { name: name.to_string(), kind };

        DatasetInfo {
            name: DATASET_NAME.to_string(),
            version: DATASET_VERSION.to_string(),
            description: DATASET_DESCRIPTION.to_string(),
            citation: DATASET_CITATION.to_string(),
            homepage: DATASET_HOMEPAGE.to_string(),
            features: vec![
                feature("id", FeatureKind::String),
                feature("tokens", FeatureKind::sequence(FeatureKind::String)),
                feature(
                    "bboxes",
                    FeatureKind::sequence(FeatureKind::sequence(FeatureKind::Int64)),
                ),
                feature(
                    "ner_tags",
                    FeatureKind::sequence(FeatureKind::ClassLabel {
                        names: self.config.labels.names().to_vec(),
                    }),
                ),
                feature("image_path", FeatureKind::String),
                feature("image", FeatureKind::Image),
            ],
        }
    }

    pub fn split_generator(&self, split: Split) -> SplitGenerator {
        let manifest = match split {
            Split::Train => &self.config.train_manifest,
            Split::Test => &self.config.test_manifest,
        };
        SplitGenerator {
            split,
            manifest: self.config.data_dir.join(manifest),
            data_dir: self.config.data_dir.clone(),
        }
    }

    pub fn split_generators(&self) -> Vec<SplitGenerator> {
        Split::ALL.iter().map(|&s| self.split_generator(s)).collect()
    }

    pub fn class_list(&self) -> Result<ClassList, DatasetError> {
        ClassList::load(&self.config.class_list_path())
    }

    /// Start a pass over `split`. The class list is loaded first, so a
    /// missing class list fails here, before any record is read.
    pub fn records(&self, split: Split) -> Result<Records<BufReader<File>>, DatasetError> {
        let class_list = self.class_list()?;
        let generator = self.split_generator(split);

        info!("Generating examples from {}", generator.manifest.display());
        let lines = ManifestReader::open(&generator.manifest)?;
        Ok(Records::new(lines, generator.data_dir, class_list))
    }

    pub fn generate_examples<O: GenerationObserver>(
        &self,
        split: Split,
        observer: O,
    ) -> Result<Examples<BufReader<File>, O>, DatasetError> {
        Ok(Examples::new(self.records(split)?, observer, split.as_str()))
    }
}

/// Result of processing one manifest line
#[derive(Debug)]
pub enum RecordOutcome {
    Example {
        index: usize,
        example: Example,
        /// Some normalized coordinate is above the grid
        out_of_range: bool,
    },
    Skipped {
        index: usize,
        raw_line: String,
        reason: SkipReason,
    },
}

impl RecordOutcome {
    pub fn index(&self) -> usize {
        match self {
            RecordOutcome::Example { index, .. } | RecordOutcome::Skipped { index, .. } => *index,
        }
    }
}

pub struct Records<R> {
    lines: ManifestReader<R>,
    data_dir: PathBuf,
    class_list: ClassList,
    decode: TimingStats,
}

impl<R: BufRead> Records<R> {
    pub fn new(lines: ManifestReader<R>, data_dir: PathBuf, class_list: ClassList) -> Self {
        Self {
            lines,
            data_dir,
            class_list,
            decode: TimingStats::new("Image decode"),
        }
    }

    pub fn class_list(&self) -> &ClassList {
        &self.class_list
    }

    pub fn lines_read(&self) -> usize {
        self.lines.lines_read()
    }

    pub fn decode_stats(&self) -> &TimingStats {
        &self.decode
    }
}

fn build_example(
    line: &RawLine,
    data_dir: &Path,
    decode: &mut TimingStats,
) -> Result<(Example, bool), SkipReason> {
    let record = parse_record(line)?;
    let image_path = data_dir.join(&record.file_name);

    let loaded = decode.time(|| load_image(&image_path))?;

    let bboxes = normalize_bboxes(&record.bboxes, loaded.size);
    let out_of_range = exceeds_grid(&bboxes);

    let example = Example {
        id: line.index.to_string(),
        tokens: record.tokens,
        bboxes,
        ner_tags: record.ner_tags,
        image_path,
        image: loaded.image,
    };
    Ok((example, out_of_range))
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<RecordOutcome, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };

        let outcome = match build_example(&line, &self.data_dir, &mut self.decode) {
            Ok((example, out_of_range)) => RecordOutcome::Example {
                index: line.index,
                example,
                out_of_range,
            },
            Err(reason) => RecordOutcome::Skipped {
                index: line.index,
                raw_line: line.display_text(),
                reason,
            },
        };
        Some(Ok(outcome))
    }
}

/// Successful examples of one split, in manifest order.
pub struct Examples<R, O> {
    records: Records<R>,
    observer: O,
    stats: GenerationStats,
    label: String,
    finished: bool,
}

impl<R: BufRead, O: GenerationObserver> Examples<R, O> {
    pub fn new(records: Records<R>, observer: O, label: &str) -> Self {
        Self {
            records,
            observer,
            stats: GenerationStats::default(),
            label: label.to_string(),
            finished: false,
        }
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn class_list(&self) -> &ClassList {
        self.records.class_list()
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Log the pass summary. Runs on its own once the iterator is
    /// exhausted; call it when stopping early. Logs at most once.
    pub fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.sync_stats();
            self.stats.log_summary(&self.label);
        }
    }

    fn sync_stats(&mut self) {
        self.stats.lines_read = self.records.lines_read();
        self.stats.decode = self.records.decode_stats().clone();
    }
}

impl<R: BufRead, O: GenerationObserver> Iterator for Examples<R, O> {
    type Item = Result<(usize, Example), DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let outcome = match self.records.next() {
                Some(Ok(outcome)) => outcome,
                Some(Err(e)) => {
                    self.sync_stats();
                    return Some(Err(e));
                }
                None => {
                    self.finish();
                    return None;
                }
            };

            match outcome {
                RecordOutcome::Example { index, example, out_of_range } => {
                    self.stats.emitted += 1;
                    if out_of_range {
                        self.stats.out_of_range_images += 1;
                        self.observer.bbox_out_of_range(index, &example.image_path);
                    }
                    self.sync_stats();
                    return Some(Ok((index, example)));
                }
                RecordOutcome::Skipped { index, raw_line, reason } => {
                    self.stats.skipped += 1;
                    self.observer.record_skipped(index, &raw_line, &reason);
                }
            }
        }
    }
}
