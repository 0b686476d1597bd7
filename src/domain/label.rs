// ============================================================
// Layer 3 — Label Vocabulary
// ============================================================
// The ordered list of semantic-role label names.
//
// A label's INDEX is its identity for the whole run: the model's
// output column i, the i-th entry of every multi-hot row, and the
// i-th class weight all refer to the same label. The vocabulary
// therefore has to be identical between training and evaluation
// of one model; it is stored alongside the encoder config as
// id2label so a reloaded model can be checked against the corpus.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelVocabulary {
    names: Vec<String>,
}

impl LabelVocabulary {
    /// Build a vocabulary, rejecting empty or duplicated label lists.
    pub fn new(names: Vec<String>) -> Result<Self, ConfigurationError> {
        if names.is_empty() {
            return Err(ConfigurationError::EmptyVocabulary);
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ConfigurationError::DuplicateLabel(name.clone()));
            }
        }
        Ok(Self { names })
    }

    /// Number of labels (L); never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Render a set of label indices as names, skipping unknown indices.
    pub fn names_of<'s, 'i>(&'s self, indices: impl IntoIterator<Item = &'i usize>) -> Vec<&'s str> {
        indices.into_iter().filter_map(|&i| self.name(i)).collect()
    }
}

impl TryFrom<Vec<String>> for LabelVocabulary {
    type Error = ConfigurationError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<LabelVocabulary> for Vec<String> {
    fn from(v: LabelVocabulary) -> Self {
        v.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> LabelVocabulary {
        LabelVocabulary::new(vec!["AGENT".into(), "THEME".into(), "LOCATION".into()]).unwrap()
    }

    #[test]
    fn test_index_is_identity() {
        let v = roles();
        assert_eq!(v.len(), 3);
        assert_eq!(v.name(1), Some("THEME"));
        assert_eq!(v.name(2), Some("LOCATION"));
        assert_eq!(v.name(3), None);
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        assert_eq!(LabelVocabulary::new(vec![]), Err(ConfigurationError::EmptyVocabulary));
    }

    #[test]
    fn test_duplicate_label_is_rejected() {
        let err = LabelVocabulary::new(vec!["AGENT".into(), "AGENT".into()]).unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateLabel("AGENT".into()));
    }

    #[test]
    fn test_deserialises_from_plain_json_array() {
        let v: LabelVocabulary = serde_json::from_str(r#"["AGENT","THEME"]"#).unwrap();
        assert_eq!(v.names(), &["AGENT".to_string(), "THEME".to_string()]);

        let bad = serde_json::from_str::<LabelVocabulary>("[]");
        assert!(bad.is_err());
    }

    #[test]
    fn test_names_of_skips_unknown_indices() {
        let v = roles();
        assert_eq!(v.names_of(&[0, 2, 7]), vec!["AGENT", "LOCATION"]);
    }
}
