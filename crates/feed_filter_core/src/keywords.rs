use std::sync::Arc;

/// Trim and lowercase a raw keyword; `None` when nothing is left.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalized, deduplicated keywords; immutable once built.
///
/// Entries keep the order in which they first appeared. Cloning is cheap, so an
/// activation can hand the same snapshot to every batch it handles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeywordSet {
    entries: Arc<[String]>,
}

impl KeywordSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from raw input, dropping blanks and duplicates after normalization.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<String> = Vec::new();
        for keyword in raw.into_iter().filter_map(|k| normalize_keyword(k.as_ref())) {
            if !entries.contains(&keyword) {
                entries.push(keyword);
            }
        }
        Self {
            entries: entries.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.entries.iter().any(|k| k == keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Stable display order.
    pub fn sorted(&self) -> Vec<String> {
        let mut keywords = self.entries.to_vec();
        keywords.sort();
        keywords
    }
}
