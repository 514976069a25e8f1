/// JSON Lines materialization
///
/// Writes one object per example. Pixel data stays out of the file; the
/// image is referenced by path and described by its size.
use std::io::Write;

#[allow(unused_imports)]
use log::{debug, warn};

use crate::error::DatasetError;
use crate::example::{Example, ExampleRow};
use crate::labels::LabelResolver;

pub struct JsonlWriter<'a, W: Write> {
    writer: W,
    resolver: LabelResolver<'a>,
    rows: usize,
}

impl<'a, W: Write> JsonlWriter<'a, W> {
    pub fn new(writer: W, resolver: LabelResolver<'a>) -> Self {
        Self { writer, resolver, rows: 0 }
    }

    pub fn write_example(&mut self, example: &Example) -> Result<(), DatasetError> {
        let ner_tag_ids = match self.resolver.resolve_all(&example.ner_tags) {
            Ok(ids) => Some(ids),
            Err(e) => {
                warn!("Example {}: {}, writing ner_tag_ids as null", example.id, e);
                None
            }
        };

        let row = ExampleRow::new(example, ner_tag_ids);
        let write_err = |source| DatasetError::Write { id: example.id.clone(), source };

        serde_json::to_writer(&mut self.writer, &row)
            .map_err(|e| write_err(std::io::Error::from(e)))?;
        self.writer.write_all(b"\n").map_err(write_err)?;

        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the number of rows written.
    pub fn finish(mut self) -> Result<usize, DatasetError> {
        self.writer.flush().map_err(|source| DatasetError::Write {
            id: "<flush>".to_string(),
            source,
        })?;
        debug!("Wrote {} rows", self.rows);
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{ClassList, LabelVocabulary, NerTag};
    use image::RgbImage;
    use std::path::PathBuf;

    fn example(id: &str, tags: Vec<NerTag>) -> Example {
        Example {
            id: id.to_string(),
            tokens: tags.iter().map(|t| t.to_string()).collect(),
            bboxes: tags.iter().map(|_| [0, 0, 1000, 1000]).collect(),
            ner_tags: tags,
            image_path: PathBuf::from("data/images/a.png"),
            image: RgbImage::new(30, 20),
        }
    }

    #[test]
    fn test_rows_are_json_lines() {
        let vocab = LabelVocabulary::default();
        let class_list = ClassList::parse("9 taxYear\n").unwrap();
        let mut out = Vec::new();

        let mut writer = JsonlWriter::new(&mut out, LabelResolver::new(&vocab, &class_list));
        writer
            .write_example(&example("0", vec![NerTag::Name("OTHER".into()), NerTag::Index(9)]))
            .unwrap();
        writer
            .write_example(&example("1", vec![NerTag::Name("unknown".into())]))
            .unwrap();
        assert_eq!(writer.rows(), 2);
        assert_eq!(writer.finish().unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0]["id"], "0");
        assert_eq!(rows[0]["ner_tags"], serde_json::json!(["OTHER", 9]));
        assert_eq!(rows[0]["ner_tag_ids"], serde_json::json!([15, 14]));
        assert_eq!(rows[0]["bboxes"], serde_json::json!([[0, 0, 1000, 1000], [0, 0, 1000, 1000]]));
        assert_eq!(rows[0]["image_path"], "data/images/a.png");
        assert_eq!(rows[0]["image_width"], 30);
        assert_eq!(rows[0]["image_height"], 20);

        assert!(rows[1]["ner_tag_ids"].is_null());
    }
}
