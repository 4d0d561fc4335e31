//! Converted source documents

use serde::{Deserialize, Serialize};

/// A document as produced by the upstream document-to-text converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Source identifier
    pub id: String,
    /// Document title, usually the school name
    pub title: Option<String>,
    /// Full converted text (Markdown-like)
    pub full_text: Option<String>,
}

impl Source {
    /// Create a source with text and no title
    pub fn new(id: impl Into<String>, full_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            full_text: Some(full_text.into()),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Text content if present and non-blank
    pub fn text(&self) -> Option<&str> {
        self.full_text.as_deref().filter(|t| !t.trim().is_empty())
    }
}
