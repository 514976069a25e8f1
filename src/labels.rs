/// Entity label vocabulary and class list handling
///
/// The vocabulary is the closed set of class names a trainer sees. The class
/// list (`class_list.txt`) maps annotation codes to names; together they let
/// a raw `ner_tag` be resolved to a class index at materialization time.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::error::{DatasetError, LabelError};

/// W-2 form entity classes, `OTHER` last
pub const DEFAULT_LABELS: [&str; 16] = [
    "employerName",
    "employerAddressStreet_name",
    "employerAddressCity",
    "employerAddressState",
    "employerAddressZip",
    "einEmployerIdentificationNumber",
    "employeeName",
    "ssnOfEmployee",
    "box1WagesTipsAndOtherCompensations",
    "box2FederalIncomeTaxWithheld",
    "box3SocialSecurityWages",
    "box4SocialSecurityTaxWithheld",
    "box16StateWagesTips",
    "box17StateIncomeTax",
    "taxYear",
    "OTHER",
];

/// A raw entity tag as it appears in a manifest record: a class name or a
/// numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NerTag {
    Index(i64),
    Name(String),
}

impl fmt::Display for NerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NerTag::Index(i) => write!(f, "{}", i),
            NerTag::Name(name) => f.write_str(name),
        }
    }
}

/// Closed, ordered set of class names. Cheap to share by reference; never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelVocabulary {
    pub fn new<I, S>(names: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(LabelError::EmptyVocabulary);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(LabelError::DuplicateLabel(name.clone()));
            }
        }

        Ok(Self { names, index })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self {
            names: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            index: DEFAULT_LABELS
                .iter()
                .enumerate()
                .map(|(i, s)| (s.to_string(), i))
                .collect(),
        }
    }
}

/// Parsed `class_list.txt`: code -> label name, in file order.
#[derive(Debug, Clone, Default)]
pub struct ClassList {
    entries: Vec<(String, String)>,
    by_code: HashMap<String, usize>,
}

impl ClassList {
    /// Load the class list. A missing file is reported as
    /// `ClassListNotFound` so callers can fail before producing anything.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatasetError::from_open(path.to_path_buf(), e, DatasetError::ClassListNotFound)
        })?;

        let list = Self::parse(&content).map_err(|(line, message)| DatasetError::ClassListInvalid {
            path: path.to_path_buf(),
            line,
            message,
        })?;

        debug!("Loaded {} class list entries from {}", list.len(), path.display());
        Ok(list)
    }

    /// Parse whitespace-delimited `code name` rows. Errors carry the 1-based
    /// line number.
    pub fn parse(content: &str) -> Result<Self, (usize, String)> {
        let mut list = ClassList::default();

        for (i, line) in content.lines().enumerate() {
            let columns: Vec<&str> = line.split_whitespace().collect();
            match columns.as_slice() {
                [] => continue,
                [code, name] => {
                    if let Some(&existing) = list.by_code.get(*code) {
                        warn!("Duplicate class code '{}' on line {}, keeping the last one", code, i + 1);
                        list.entries[existing].1 = name.to_string();
                        continue;
                    }
                    list.by_code.insert(code.to_string(), list.entries.len());
                    list.entries.push((code.to_string(), name.to_string()));
                }
                other => {
                    return Err((i + 1, format!("expected 2 columns, found {}", other.len())));
                }
            }
        }

        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name_for(&self, code: &str) -> Option<&str> {
        self.by_code
            .get(code)
            .map(|&i| self.entries[i].1.as_str())
    }
}

/// Resolves raw tags to vocabulary indices.
///
/// Order: vocabulary name, then class-list code, then (for integers) a
/// direct in-range index.
pub struct LabelResolver<'a> {
    vocabulary: &'a LabelVocabulary,
    class_list: &'a ClassList,
}

impl<'a> LabelResolver<'a> {
    pub fn new(vocabulary: &'a LabelVocabulary, class_list: &'a ClassList) -> Self {
        Self { vocabulary, class_list }
    }

    pub fn resolve(&self, tag: &NerTag) -> Result<usize, LabelError> {
        let code = match tag {
            NerTag::Name(name) => {
                if let Some(i) = self.vocabulary.index_of(name) {
                    return Ok(i);
                }
                name.clone()
            }
            NerTag::Index(i) => i.to_string(),
        };

        if let Some(i) = self
            .class_list
            .name_for(&code)
            .and_then(|name| self.vocabulary.index_of(name))
        {
            return Ok(i);
        }

        if let NerTag::Index(i) = tag {
            if let Ok(i) = usize::try_from(*i) {
                if i < self.vocabulary.len() {
                    return Ok(i);
                }
            }
        }

        Err(LabelError::UnknownLabel(tag.to_string()))
    }

    pub fn resolve_all(&self, tags: &[NerTag]) -> Result<Vec<usize>, LabelError> {
        tags.iter().map(|t| self.resolve(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let vocab = LabelVocabulary::default();
        assert_eq!(vocab.len(), 16);
        assert_eq!(vocab.index_of("employerName"), Some(0));
        assert_eq!(vocab.index_of("OTHER"), Some(15));
        assert_eq!(vocab.name_of(14), Some("taxYear"));
        assert_eq!(vocab, LabelVocabulary::new(DEFAULT_LABELS).unwrap());
    }

    #[test]
    fn test_vocabulary_rejects_duplicates_and_empty() {
        assert_eq!(
            LabelVocabulary::new(["a", "b", "a"]),
            Err(LabelError::DuplicateLabel("a".to_string()))
        );
        assert_eq!(
            LabelVocabulary::new(Vec::<String>::new()),
            Err(LabelError::EmptyVocabulary)
        );
    }

    #[test]
    fn test_ner_tag_deserializes_names_and_indices() {
        let tags: Vec<NerTag> = serde_json::from_str(r#"["OTHER", 3, "taxYear"]"#).unwrap();
        assert_eq!(
            tags,
            vec![
                NerTag::Name("OTHER".to_string()),
                NerTag::Index(3),
                NerTag::Name("taxYear".to_string()),
            ]
        );
    }

    #[test]
    fn test_class_list_parse() {
        let list = ClassList::parse("0 employerName\n\n1   taxYear\r\nO OTHER\n").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.name_for("1"), Some("taxYear"));
        assert_eq!(list.name_for("O"), Some("OTHER"));
        assert_eq!(list.name_for("2"), None);
    }

    #[test]
    fn test_class_list_duplicate_code_keeps_last_name() {
        let list = ClassList::parse("0 employerName\n1 taxYear\n0 employerAddress\n").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.name_for("0"), Some("employerAddress"));
        assert_eq!(list.name_for("1"), Some("taxYear"));
    }

    #[test]
    fn test_class_list_rejects_bad_rows() {
        let err = ClassList::parse("0 employerName\n1 tax Year\n").unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_class_list_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClassList::load(&dir.path().join("class_list.txt")).unwrap_err();
        assert!(matches!(err, DatasetError::ClassListNotFound(_)));
    }

    #[test]
    fn test_resolver_order() {
        let vocab = LabelVocabulary::default();
        let list = ClassList::parse("7 taxYear\nB-EMP employerName\n").unwrap();
        let resolver = LabelResolver::new(&vocab, &list);

        assert_eq!(resolver.resolve(&NerTag::Name("OTHER".into())), Ok(15));
        assert_eq!(resolver.resolve(&NerTag::Name("B-EMP".into())), Ok(0));
        // class list wins over the direct index
        assert_eq!(resolver.resolve(&NerTag::Index(7)), Ok(14));
        assert_eq!(resolver.resolve(&NerTag::Index(3)), Ok(3));
        assert_eq!(
            resolver.resolve(&NerTag::Index(16)),
            Err(LabelError::UnknownLabel("16".into()))
        );
        assert_eq!(
            resolver.resolve(&NerTag::Index(-1)),
            Err(LabelError::UnknownLabel("-1".into()))
        );
        assert!(resolver
            .resolve_all(&[NerTag::Index(0), NerTag::Name("nope".into())])
            .is_err());
    }
}
