use crate::KeywordSet;

/// What the keyword store holds: the raw keyword list and the enabled flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    pub keywords: Vec<String>,
    pub enabled: bool,
}

impl Default for FilterSettings {
    /// Zero keywords, enabled: filtering is active but inert.
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            enabled: true,
        }
    }
}

impl FilterSettings {
    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::from_raw(&self.keywords)
    }

    /// Apply a partial write on top of these settings.
    pub fn merged(mut self, patch: &SettingsPatch) -> Self {
        if let Some(keywords) = &patch.keywords {
            self.keywords = keywords.clone();
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        self
    }
}

/// Partial write to the keyword store; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsPatch {
    pub keywords: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn keywords(keywords: Vec<String>) -> Self {
        Self {
            keywords: Some(keywords),
            enabled: None,
        }
    }

    pub fn enabled(enabled: bool) -> Self {
        Self {
            keywords: None,
            enabled: Some(enabled),
        }
    }
}
