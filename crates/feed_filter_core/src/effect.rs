use crate::{FilterSettings, SettingsPatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEffect {
    /// Write the changed fields to the keyword store.
    Persist(SettingsPatch),
    /// Re-deliver a fresh activation to every open feed view.
    RefreshFeedViews {
        settings: FilterSettings,
        /// Hidden items can only be revealed again from an unfiltered baseline.
        requires_reload: bool,
    },
    /// Hand the sorted keyword list to the export sink.
    Export { keywords: Vec<String> },
}
