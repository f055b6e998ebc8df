//! Configuration persistence seam.
//!
//! The engine treats storage as a single structured document: the engine
//! tunables plus one record per provider instance. What backs the document
//! is up to the embedder; a JSON file store and an in-memory store ship
//! here.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use resolver_types::{ConfigError, EngineConfig, ProviderConfig};

const SETTINGS_FILE: &str = "settings.json";

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(default)]
    pub engine: EngineConfig,
    /// Provider records keyed by provider identifier
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// Read/write access to the persisted settings document.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<StoredSettings, ConfigError>;
    fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError>;
}

/// Volatile store for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoredSettings>,
}

impl MemoryStore {
    pub fn new(settings: StoredSettings) -> Self {
        Self { inner: Mutex::new(settings) }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<StoredSettings, ConfigError> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError> {
        *self.inner.lock() = settings.clone();
        Ok(())
    }
}

/// JSON-file-backed store.
///
/// A missing file is not an error: it loads as defaults, and the first save
/// creates it (including parent directories).
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform data directory (`<data_dir>/resolver/`).
    pub fn default_location() -> Result<Self, ConfigError> {
        let data_dir = dirs::data_dir().ok_or_else(|| ConfigError::LoadFailed {
            message: "no platform data directory".to_string(),
        })?;
        Ok(Self::new(data_dir.join("resolver").join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<StoredSettings, ConfigError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No settings file, using defaults");
            return Ok(StoredSettings::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::LoadFailed { message: e.to_string() })?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Invalid { message: e.to_string() })
    }

    fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveFailed { message: e.to_string() })?;
        }
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| ConfigError::SaveFailed { message: e.to_string() })?;
        fs::write(&self.path, content)
            .map_err(|e| ConfigError::SaveFailed { message: e.to_string() })?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
