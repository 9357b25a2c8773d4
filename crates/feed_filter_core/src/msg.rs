#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminMsg {
    /// Store read completed.
    SettingsLoaded(crate::FilterSettings),
    /// Store read failed; defaults stay in place.
    SettingsLoadFailed(String),
    /// User edited the keyword input box.
    KeywordInputChanged(String),
    /// User clicked Add.
    AddClicked,
    /// User clicked a keyword in the list, which removes it.
    KeywordClicked(String),
    /// User clicked Reset.
    ResetClicked,
    /// User clicked Enable/Disable.
    ToggleClicked,
    /// User clicked Export.
    ExportClicked,
    /// A store write failed.
    PersistFailed(String),
    /// Writing the keyword export failed.
    ExportFailed(String),
    /// Fallback for placeholder wiring.
    NoOp,
}
