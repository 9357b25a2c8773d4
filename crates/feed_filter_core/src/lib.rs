//! Feed filter core: keyword matching and the pure administrative state machine.
mod effect;
mod keywords;
mod matcher;
mod msg;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::AdminEffect;
pub use keywords::{normalize_keyword, KeywordSet};
pub use matcher::{first_match, should_hide};
pub use msg::AdminMsg;
pub use settings::{FilterSettings, SettingsPatch};
pub use state::AdminState;
pub use update::update;
pub use view_model::AdminViewModel;
