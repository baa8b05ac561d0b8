//! Known-failure hints: a plain `{test id: reason}` lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFailures {
    reasons: BTreeMap<String, String>,
}

impl KnownFailures {
    /// Load hints from a JSON object file. A missing or malformed file gives
    /// an empty set.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            warn!(path = %path.display(), "known-failure hints not found, continuing without them");
            return Self::default();
        };
        match serde_json::from_str::<BTreeMap<String, String>>(&content) {
            Ok(reasons) => {
                info!(path = %path.display(), count = reasons.len(), "loaded known-failure hints");
                Self { reasons }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "known-failure hints are malformed, ignoring them");
                Self::default()
            }
        }
    }

    /// Exact-match lookup.
    pub fn reason(&self, id: &str) -> Option<&str> {
        self.reasons.get(id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

impl FromIterator<(String, String)> for KnownFailures {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            reasons: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let hints = KnownFailures::load(Path::new("/nonexistent/hints.json"));
        assert!(hints.is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hints.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(KnownFailures::load(&path).is_empty());
    }

    #[test]
    fn test_exact_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hints.json");
        fs::write(&path, r#"{"tests/main/crash": "LP: #1234 kernel oops"}"#).unwrap();
        let hints = KnownFailures::load(&path);
        assert_eq!(hints.reason("tests/main/crash"), Some("LP: #1234 kernel oops"));
        assert_eq!(hints.reason("tests/main/cras"), None);
    }
}
