use crate::{normalize_keyword, AdminEffect, AdminMsg, AdminState, SettingsPatch};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AdminState, msg: AdminMsg) -> (AdminState, Vec<AdminEffect>) {
    let effects = match msg {
        AdminMsg::SettingsLoaded(settings) => {
            state.replace_settings(&settings);
            Vec::new()
        }
        AdminMsg::SettingsLoadFailed(message) | AdminMsg::PersistFailed(message) => {
            state.set_error(message);
            Vec::new()
        }
        AdminMsg::ExportFailed(message) => {
            state.set_error(format!("export failed: {message}"));
            Vec::new()
        }
        AdminMsg::KeywordInputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        AdminMsg::AddClicked => {
            let Some(keyword) = normalize_keyword(state.input()) else {
                return (state, Vec::new());
            };
            state.clear_input();
            if state.insert_keyword(keyword) {
                keywords_changed(&state, false)
            } else {
                Vec::new()
            }
        }
        AdminMsg::KeywordClicked(keyword) => {
            if state.remove_keyword(&keyword) {
                keywords_changed(&state, true)
            } else {
                Vec::new()
            }
        }
        AdminMsg::ResetClicked => {
            if state.clear_keywords() {
                keywords_changed(&state, true)
            } else {
                Vec::new()
            }
        }
        AdminMsg::ToggleClicked => {
            let enabled = state.toggle_enabled();
            vec![
                AdminEffect::Persist(SettingsPatch::enabled(enabled)),
                AdminEffect::RefreshFeedViews {
                    settings: state.settings(),
                    requires_reload: !enabled,
                },
            ]
        }
        AdminMsg::ExportClicked => vec![AdminEffect::Export {
            keywords: state.keywords().to_vec(),
        }],
        AdminMsg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn keywords_changed(state: &AdminState, requires_reload: bool) -> Vec<AdminEffect> {
    vec![
        AdminEffect::Persist(SettingsPatch::keywords(state.keywords().to_vec())),
        AdminEffect::RefreshFeedViews {
            settings: state.settings(),
            requires_reload,
        },
    ]
}
