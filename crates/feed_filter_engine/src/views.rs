use feed_filter_core::FilterSettings;
use feed_logging::{feed_info, feed_warn};

use crate::dom::{Document, ObserveError};
use crate::filter::LiveFilter;
use crate::selectors::CompiledSelectors;
use crate::store::{load_settings_or_default, SettingsStore};

/// How a settings change reaches an open feed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Back to the unfiltered page, then activate. Needed when hidden items may have to reappear.
    Reload,
    /// Activate again on the current page; earlier hides stay.
    Reinject,
}

impl RefreshMode {
    pub fn for_change(requires_reload: bool) -> Self {
        if requires_reload {
            RefreshMode::Reload
        } else {
            RefreshMode::Reinject
        }
    }
}

/// One open feed page and its filter.
#[derive(Debug)]
pub struct FeedView {
    name: String,
    document: Document,
    filter: LiveFilter,
}

impl FeedView {
    pub fn new(name: impl Into<String>, document: Document, selectors: CompiledSelectors) -> Self {
        Self {
            name: name.into(),
            document,
            filter: LiveFilter::new(selectors),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn filter(&self) -> &LiveFilter {
        &self.filter
    }

    /// Activate with the settings' keywords, or deactivate when filtering is off.
    pub fn apply(&mut self, settings: &FilterSettings) -> Result<(), ObserveError> {
        if settings.enabled {
            self.filter
                .activate(&mut self.document, settings.keyword_set())?;
        } else {
            self.filter.deactivate(&mut self.document);
        }
        Ok(())
    }

    fn refresh(&mut self, settings: &FilterSettings, mode: RefreshMode) -> Result<(), ObserveError> {
        if mode == RefreshMode::Reload {
            self.document.reload();
        }
        self.apply(settings)
    }
}

/// A view left without filtering because its host cannot observe mutations.
#[derive(Debug, PartialEq, Eq)]
pub struct DegradedView {
    pub name: String,
    pub error: ObserveError,
}

/// Every open feed view; the refresh trigger for settings changes.
#[derive(Debug, Default)]
pub struct FeedViews {
    views: Vec<FeedView>,
}

impl FeedViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, view: FeedView) {
        self.views.push(view);
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedView> {
        self.views.iter()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FeedView> {
        self.views.iter_mut().find(|view| view.name == name)
    }

    /// Deliver a fresh activation to every view. Views that cannot be filtered are returned.
    pub fn refresh_all(&mut self, settings: &FilterSettings, mode: RefreshMode) -> Vec<DegradedView> {
        let mut degraded = Vec::new();
        for view in &mut self.views {
            if let Err(error) = view.refresh(settings, mode) {
                feed_warn!("Feed view {} runs unfiltered: {}", view.name, error);
                degraded.push(DegradedView {
                    name: view.name.clone(),
                    error,
                });
            }
        }
        feed_info!(
            "Refreshed {} feed views ({:?}), {} degraded",
            self.views.len(),
            mode,
            degraded.len()
        );
        degraded
    }
}

/// Page start-up: read settings (inert default on failure) and activate when enabled.
pub async fn bootstrap(
    document: &mut Document,
    store: &dyn SettingsStore,
    selectors: CompiledSelectors,
) -> Result<LiveFilter, ObserveError> {
    let settings = load_settings_or_default(store).await;
    let mut filter = LiveFilter::new(selectors);
    if settings.enabled {
        filter.activate(document, settings.keyword_set())?;
    } else {
        feed_info!("Filtering disabled; page left untouched");
    }
    Ok(filter)
}
