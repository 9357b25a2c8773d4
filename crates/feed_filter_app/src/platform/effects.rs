use std::path::PathBuf;

use chrono::Utc;
use feed_filter_core::{AdminEffect, AdminMsg};
use feed_filter_engine::{DegradedView, FeedViews, RefreshMode, SettingsStore};
use feed_logging::{feed_error, feed_info, feed_warn};

use super::persistence::{export_json, write_export};

/// What running a batch of effects produced for the caller.
#[derive(Debug, Default)]
pub(crate) struct EffectOutcome {
    /// Messages to feed back into `update`.
    pub feedback: Vec<AdminMsg>,
    /// Export text to print when no output file was given.
    pub printed_export: Option<String>,
    pub degraded: Vec<DegradedView>,
}

pub(crate) struct EffectRunner<'a> {
    store: &'a dyn SettingsStore,
    views: &'a mut FeedViews,
    export_out: Option<PathBuf>,
}

impl<'a> EffectRunner<'a> {
    pub fn new(
        store: &'a dyn SettingsStore,
        views: &'a mut FeedViews,
        export_out: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            views,
            export_out,
        }
    }

    pub async fn run(&mut self, effects: Vec<AdminEffect>) -> EffectOutcome {
        let mut outcome = EffectOutcome::default();
        let mut persist_failed = false;
        for effect in effects {
            match effect {
                AdminEffect::Persist(patch) => {
                    if let Err(err) = self.store.set(patch).await {
                        feed_error!("Failed to save settings: {}", err);
                        persist_failed = true;
                        outcome.feedback.push(AdminMsg::PersistFailed(err.to_string()));
                    }
                }
                AdminEffect::RefreshFeedViews {
                    settings,
                    requires_reload,
                } => {
                    if persist_failed {
                        feed_warn!("Settings not saved; open views keep their current filter");
                        continue;
                    }
                    let mode = RefreshMode::for_change(requires_reload);
                    feed_info!("Refreshing {} open views ({:?})", self.views.len(), mode);
                    outcome
                        .degraded
                        .extend(self.views.refresh_all(&settings, mode));
                }
                AdminEffect::Export { keywords } => {
                    let exported = export_json(&keywords, Utc::now().to_rfc3339())
                        .and_then(|json| write_export(self.export_out.as_deref(), &json));
                    match exported {
                        Ok(printed) => outcome.printed_export = printed,
                        Err(err) => {
                            feed_error!("Export failed: {:#}", err);
                            outcome.feedback.push(AdminMsg::ExportFailed(format!("{err:#}")));
                        }
                    }
                }
            }
        }
        outcome
    }
}
