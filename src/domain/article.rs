use serde::{Deserialize, Serialize};

/// Title and main text of a scraped page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSnapshot {
    pub title: String,
    pub text: String,
    pub word_count: usize,
}

impl ArticleSnapshot {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let title = title.into();
        let text = text.into();
        let word_count = text.split_whitespace().count();
        Self {
            title,
            text,
            word_count,
        }
    }

    /// True when neither a title nor any body text was extracted
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.text.trim().is_empty()
    }
}
