use std::path::PathBuf;
use image::RgbImage;
use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::labels::NerTag;

/// One training example, emitted per valid manifest line
#[derive(Debug, Clone)]
pub struct Example {
    /// Decimal zero-based manifest line index
    pub id: String,
    pub tokens: Vec<String>,
    /// Normalized to the 0..=1000 grid
    pub bboxes: Vec<BoundingBox>,
    pub ner_tags: Vec<NerTag>,
    pub image_path: PathBuf,
    pub image: RgbImage,
}

/// Serializable form of an [`Example`] without pixel data.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleRow<'a> {
    pub id: &'a str,
    pub tokens: &'a [String],
    pub bboxes: &'a [BoundingBox],
    pub ner_tags: &'a [NerTag],
    /// Resolved class indices; `None` when a tag is not in the vocabulary
    pub ner_tag_ids: Option<Vec<usize>>,
    pub image_path: String,
    pub image_width: u32,
    pub image_height: u32,
}

impl<'a> ExampleRow<'a> {
    pub fn new(example: &'a Example, ner_tag_ids: Option<Vec<usize>>) -> Self {
        Self {
            id: &example.id,
            tokens: &example.tokens,
            bboxes: &example.bboxes,
            ner_tags: &example.ner_tags,
            ner_tag_ids,
            image_path: example.image_path.to_string_lossy().into_owned(),
            image_width: example.image.width(),
            image_height: example.image.height(),
        }
    }
}
