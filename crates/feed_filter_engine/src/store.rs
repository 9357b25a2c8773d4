use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use feed_filter_core::{FilterSettings, KeywordSet, SettingsPatch};
use feed_logging::{feed_info, feed_warn};
use serde::{Deserialize, Serialize};

use crate::persist::{write_atomic, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read settings: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(String),
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
    #[error("failed to write settings: {0}")]
    Write(#[from] PersistError),
    #[error("settings task failed: {0}")]
    Task(String),
}

/// Keyword/enabled store. Writes are partial; readers see defaults for anything never written.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<FilterSettings, StoreError>;
    async fn set(&self, patch: SettingsPatch) -> Result<(), StoreError>;
}

/// Read settings, falling back to the inert default (no keywords, enabled).
pub async fn load_settings_or_default(store: &dyn SettingsStore) -> FilterSettings {
    match store.get().await {
        Ok(settings) => settings,
        Err(err) => {
            feed_warn!("Using default filter settings: {}", err);
            FilterSettings::default()
        }
    }
}

/// Stored keyword lists are normalized, deduplicated and sorted.
fn canonical(settings: FilterSettings) -> FilterSettings {
    FilterSettings {
        keywords: KeywordSet::from_raw(&settings.keywords).sorted(),
        enabled: settings.enabled,
    }
}

/// In-process store. `failing()` builds one whose every call errors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<FilterSettings>,
    failing: bool,
}

impl MemoryStore {
    pub fn new(settings: FilterSettings) -> Self {
        Self {
            settings: Mutex::new(canonical(settings)),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Unavailable("memory store configured to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self) -> Result<FilterSettings, StoreError> {
        self.check()?;
        let guard = self
            .settings
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn set(&self, patch: SettingsPatch) -> Result<(), StoreError> {
        self.check()?;
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let current = std::mem::take(&mut *guard);
        *guard = canonical(current.merged(&patch));
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    keywords: Vec<String>,
    enabled: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        FilterSettings::default().into()
    }
}

impl From<FilterSettings> for PersistedSettings {
    fn from(settings: FilterSettings) -> Self {
        Self {
            keywords: settings.keywords,
            enabled: settings.enabled,
        }
    }
}

impl From<PersistedSettings> for FilterSettings {
    fn from(persisted: PersistedSettings) -> Self {
        Self {
            keywords: persisted.keywords,
            enabled: persisted.enabled,
        }
    }
}

/// Settings kept in a RON file, replaced atomically on every write.
#[derive(Debug)]
pub struct RonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles from this process.
    write_lock: tokio::sync::Mutex<()>,
}

impl RonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<FilterSettings, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(FilterSettings::default());
            }
            Err(err) => return Err(StoreError::Read(err)),
        };
        let persisted: PersistedSettings =
            ron::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(canonical(persisted.into()))
    }
}

#[async_trait::async_trait]
impl SettingsStore for RonFileStore {
    async fn get(&self) -> Result<FilterSettings, StoreError> {
        self.read().await
    }

    async fn set(&self, patch: SettingsPatch) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let next = canonical(self.read().await?.merged(&patch));
        let persisted = PersistedSettings::from(next);
        let content = ron::ser::to_string_pretty(&persisted, ron::ser::PrettyConfig::new())
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;
        feed_info!(
            "Saved {} keywords to {:?}",
            persisted.keywords.len(),
            self.path
        );
        Ok(())
    }
}
