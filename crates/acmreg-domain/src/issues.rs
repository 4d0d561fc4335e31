//! Data-quality issue notes

use serde::{Deserialize, Serialize};

/// Deduplicated list of data-quality notes attached to a record
///
/// Behaves as a set for membership and union, but keeps first-insertion
/// order so diagnostics read in the order problems were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DataIssues(Vec<String>);

impl DataIssues {
    /// Empty issue list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue; returns false when it was already present
    pub fn insert(&mut self, issue: impl Into<String>) -> bool {
        let issue = issue.into();
        if self.0.contains(&issue) {
            return false;
        }
        self.0.push(issue);
        true
    }

    /// Whether an issue is present
    pub fn contains(&self, issue: &str) -> bool {
        self.0.iter().any(|i| i == issue)
    }

    /// Union with another list; `self`'s order first, then new entries
    pub fn union(&self, other: &DataIssues) -> DataIssues {
        let mut merged = self.clone();
        merged.extend(other.iter().cloned());
        merged
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Number of distinct issues
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no issues
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for DataIssues {
    fn from(items: Vec<String>) -> Self {
        items.into_iter().collect()
    }
}

impl From<DataIssues> for Vec<String> {
    fn from(issues: DataIssues) -> Self {
        issues.0
    }
}

impl Extend<String> for DataIssues {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for issue in iter {
            self.insert(issue);
        }
    }
}

impl FromIterator<String> for DataIssues {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut issues = Self::new();
        issues.extend(iter);
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_ignores_duplicates() {
        let mut issues = DataIssues::new();
        assert!(issues.insert("a"));
        assert!(issues.insert("b"));
        assert!(!issues.insert("a"));
        assert_eq!(issues.as_slice(), ["a", "b"]);
    }

    #[test]
    fn test_union_keeps_left_order() {
        let left: DataIssues = vec!["x".to_string(), "y".to_string()].into();
        let right: DataIssues = vec!["y".to_string(), "z".to_string()].into();

        let merged = left.union(&right);
        assert_eq!(merged.as_slice(), ["x", "y", "z"]);
    }

    #[test]
    fn test_deserialize_dedups() {
        let issues: DataIssues = serde_json::from_str(r#"["a", "a", "b"]"#).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(serde_json::to_string(&issues).unwrap(), r#"["a","b"]"#);
    }
}
