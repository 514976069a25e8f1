/// Manifest record parser
///
/// Each manifest line is one JSON object:
///
/// ```text
/// {"file_name": "images/w2_001.png", "tokens": ["Acme"], "bboxes": [[10, 20, 80, 40]], "ner_tags": ["employerName"]}
/// ```
///
/// Unknown fields are ignored. Missing fields, wrong types and boxes that are
/// not exactly four integers fail the record.
use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use log::{debug, warn};

use crate::bbox::BoundingBox;
use crate::error::SkipReason;
use crate::labels::NerTag;
use crate::manifest::RawLine;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    /// Image path relative to the data directory
    pub file_name: String,
    pub tokens: Vec<String>,
    /// Boxes in source pixel coordinates, `[x0, y0, x1, y1]`
    pub bboxes: Vec<BoundingBox>,
    pub ner_tags: Vec<NerTag>,
}

impl Record {
    pub fn is_consistent(&self) -> bool {
        self.tokens.len() == self.bboxes.len() && self.bboxes.len() == self.ner_tags.len()
    }
}

pub fn parse_record(line: &RawLine) -> Result<Record, SkipReason> {
    let text = std::str::from_utf8(&line.bytes)?;
    let record: Record = serde_json::from_str(text)?;

    if !record.is_consistent() {
        // passed through unchanged, the trainer decides what to do with it
        warn!(
            "Record {} ({}) has {} tokens, {} boxes and {} tags",
            line.index,
            record.file_name,
            record.tokens.len(),
            record.bboxes.len(),
            record.ner_tags.len()
        );
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> RawLine {
        RawLine { index: 0, bytes: text.as_bytes().to_vec() }
    }

    #[test]
    fn test_parse_valid_record() {
        let record = parse_record(&line(
            r#"{"file_name": "a.png", "tokens": ["Acme", "2019"], "bboxes": [[1, 2, 3, 4], [5, 6, 7, 8]], "ner_tags": ["employerName", 14]}"#,
        ))
        .unwrap();

        assert_eq!(record.file_name, "a.png");
        assert_eq!(record.tokens, vec!["Acme", "2019"]);
        assert_eq!(record.bboxes, vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
        assert_eq!(record.ner_tags[1], NerTag::Index(14));
        assert!(record.is_consistent());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let record = parse_record(&line(
            r#"{"file_name": "a.png", "tokens": [], "bboxes": [], "ner_tags": [], "width": 10}"#,
        ))
        .unwrap();
        assert!(record.tokens.is_empty());
    }

    #[test]
    fn test_length_mismatch_still_parses() {
        let record = parse_record(&line(
            r#"{"file_name": "a.png", "tokens": ["x"], "bboxes": [], "ner_tags": ["OTHER"]}"#,
        ))
        .unwrap();
        assert!(!record.is_consistent());
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        let cases = [
            "",
            "{'file_name': 'a.png'}",
            r#"{"tokens": [], "bboxes": [], "ner_tags": []}"#,
            r#"{"file_name": "a.png", "tokens": [], "bboxes": [[1, 2, 3]], "ner_tags": []}"#,
            r#"{"file_name": "a.png", "tokens": [], "bboxes": [[1.5, 2, 3, 4]], "ner_tags": []}"#,
            r#"{"file_name": 3, "tokens": [], "bboxes": [], "ner_tags": []}"#,
        ];
        for case in cases {
            assert!(
                matches!(parse_record(&line(case)), Err(SkipReason::Parse(_))),
                "expected parse failure for {case:?}"
            );
        }
    }

    #[test]
    fn test_invalid_utf8() {
        let raw = RawLine { index: 4, bytes: vec![b'{', 0xff, b'}'] };
        assert!(matches!(parse_record(&raw), Err(SkipReason::InvalidUtf8(_))));
    }
}
