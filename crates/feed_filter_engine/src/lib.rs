//! Feed filter engine: observable document host, live keyword filter and its collaborators.
mod decode;
mod dom;
mod filter;
mod persist;
mod selectors;
mod store;
mod views;

pub use decode::{decode_page, DecodeError, DecodedPage};
pub use dom::{
    Document, DomError, MutationBatch, MutationCallback, MutationKind, MutationRecord,
    ObserveError, ObserveOptions, ObserverHandle,
};
pub use ego_tree::NodeId;
pub use filter::{evaluate, EngineState, FilterStats, LiveFilter, PassReport};
pub use persist::{write_atomic, PersistError};
pub use scraper::Selector;
pub use selectors::{CompiledSelectors, ItemSelectors, SelectorError};
pub use store::{load_settings_or_default, MemoryStore, RonFileStore, SettingsStore, StoreError};
pub use views::{bootstrap, DegradedView, FeedView, FeedViews, RefreshMode};
