//! In-memory FAQ table, loaded once at startup.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::FaqLoadError;

/// A curated question/answer pair with the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    /// Lowercased, trimmed, non-empty once the entry is in a [`FaqStore`].
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl FaqEntry {
    pub fn new<K, S>(question: impl Into<String>, answer: impl Into<String>, keywords: K) -> Self
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            answer: answer.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// `true` if any keyword is a substring of the already-normalized query.
    pub fn is_relevant(&self, normalized_query: &str) -> bool {
        self.keywords
            .iter()
            .any(|kw| normalized_query.contains(kw.as_str()))
    }

    fn normalize_keywords(mut self) -> Self {
        self.keywords = self
            .keywords
            .iter()
            .map(|kw| kw.trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect();
        self
    }
}

/// On-disk shape: `{"faqs": [{"question", "answer", "keywords"}]}`.
#[derive(Debug, Default, Deserialize)]
struct FaqFile {
    #[serde(default)]
    faqs: Vec<FaqEntry>,
}

/// Ordered, read-only FAQ table.
///
/// Scan order is file order; the matcher relies on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqStore {
    entries: Vec<FaqEntry>,
}

impl FaqStore {
    /// Builds a store, normalizing keywords (trim, lowercase, drop empty).
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(FaqEntry::normalize_keywords)
                .collect(),
        }
    }

    /// Loads the FAQ file, never failing.
    ///
    /// On any read/parse error the problem is logged and an empty store is
    /// returned, so every query degrades to "no match".
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => {
                info!(path = %path.display(), entries = store.len(), "FAQ loaded");
                store
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "FAQ load failed; continuing with an empty FAQ");
                Self::default()
            }
        }
    }

    /// Loads the FAQ file, reporting errors.
    ///
    /// # Errors
    /// [`FaqLoadError::Io`] if the file cannot be read, [`FaqLoadError::Json`]
    /// if it is not valid FAQ JSON.
    pub fn try_load(path: &Path) -> Result<Self, FaqLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FaqLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parses FAQ JSON.
    ///
    /// # Errors
    /// [`FaqLoadError::Json`] if `raw` is not valid FAQ JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, FaqLoadError> {
        let file: FaqFile = serde_json::from_str(raw)?;
        Ok(Self::new(file.faqs))
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"{
        "faqs": [
            {
                "question": "Jam kerja kantor?",
                "answer": "Senin-Jumat 08:00-17:00.",
                "keywords": ["Jam Kerja", " jam masuk ", ""]
            },
            {
                "question": "Bagaimana cara mengajukan cuti?",
                "answer": "Ajukan lewat portal HR minimal 3 hari sebelumnya."
            }
        ]
    }"#;

    #[test]
    fn parses_file_and_normalizes_keywords() {
        let store = FaqStore::from_json_str(SAMPLE).unwrap();
        assert_eq!(store.len(), 2);

        let first = &store.entries()[0];
        assert_eq!(first.question, "Jam kerja kantor?");
        assert_eq!(first.keywords, vec!["jam kerja", "jam masuk"]);

        // Missing keywords default to none, so the entry never matches.
        assert!(store.entries()[1].keywords.is_empty());
        assert!(!store.entries()[1].is_relevant("bagaimana cara mengajukan cuti?"));
    }

    #[test]
    fn missing_faqs_key_is_empty_store() {
        let store = FaqStore::from_json_str("{}").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let store = FaqStore::load(file.path());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn load_fails_soft_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("faq_data.json");

        assert!(matches!(
            FaqStore::try_load(&missing),
            Err(FaqLoadError::Io { .. })
        ));
        assert!(FaqStore::load(&missing).is_empty());
    }

    #[test]
    fn load_fails_soft_on_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"faqs\": [ {\"question\": 1} ]}").unwrap();

        assert!(matches!(
            FaqStore::try_load(file.path()),
            Err(FaqLoadError::Json(_))
        ));
        assert!(FaqStore::load(file.path()).is_empty());
    }

    #[test]
    fn relevance_is_substring_match() {
        let entry = FaqStore::new(vec![FaqEntry::new("q", "a", ["parkir"])]).entries()[0].clone();
        assert!(entry.is_relevant("dimana tempat parkir motor?"));
        assert!(entry.is_relevant("parkiran"));
        assert!(!entry.is_relevant("dimana kantin?"));
    }
}
