use crate::view_model::AdminViewModel;
use crate::FilterSettings;

/// State behind the administrative surface. Keywords are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminState {
    keywords: Vec<String>,
    enabled: bool,
    input: String,
    last_error: Option<String>,
    dirty: bool,
}

impl Default for AdminState {
    fn default() -> Self {
        Self::from_settings(&FilterSettings::default())
    }
}

impl AdminState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &FilterSettings) -> Self {
        Self {
            keywords: settings.keyword_set().sorted(),
            enabled: settings.enabled,
            input: String::new(),
            last_error: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> AdminViewModel {
        AdminViewModel {
            keywords: self.keywords.clone(),
            enabled: self.enabled,
            toggle_label: if self.enabled { "Disable" } else { "Enable" },
            input: self.input.clone(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn settings(&self) -> FilterSettings {
        FilterSettings {
            keywords: self.keywords.clone(),
            enabled: self.enabled,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns whether a redraw is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn replace_settings(&mut self, settings: &FilterSettings) {
        self.keywords = settings.keyword_set().sorted();
        self.enabled = settings.enabled;
        self.last_error = None;
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.dirty = true;
        }
    }

    pub(crate) fn clear_input(&mut self) {
        self.set_input(String::new());
    }

    /// Insert keeping sort order; false if already present.
    pub(crate) fn insert_keyword(&mut self, keyword: String) -> bool {
        match self.keywords.binary_search(&keyword) {
            Ok(_) => false,
            Err(pos) => {
                self.keywords.insert(pos, keyword);
                self.dirty = true;
                true
            }
        }
    }

    pub(crate) fn remove_keyword(&mut self, keyword: &str) -> bool {
        match self.keywords.iter().position(|k| k == keyword) {
            Some(pos) => {
                self.keywords.remove(pos);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Empties the list; false if it was already empty.
    pub(crate) fn clear_keywords(&mut self) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        self.keywords.clear();
        self.dirty = true;
        true
    }

    pub(crate) fn toggle_enabled(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.dirty = true;
        self.enabled
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.dirty = true;
    }
}
