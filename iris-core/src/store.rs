//! Durable storage of explicit live settings.
//!
//! The store persists only what was explicitly installed for an index, never
//! resolved defaults, so defaults can change between releases without stale
//! values pinned on disk.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::live_settings::LiveSettings;

/// Settings file name inside an index directory
pub const SETTINGS_FILENAME: &str = "live_settings.json";
/// Temp file for atomic writes (write here, then rename to SETTINGS_FILENAME)
const SETTINGS_TMP_FILENAME: &str = "live_settings.json.tmp";

/// Persistence seam for explicit live settings.
///
/// `save` must be all-or-nothing: a failed save leaves the previously saved
/// settings readable.
pub trait SettingsStore: Send + Sync {
    /// Durably record the explicit settings for `index`.
    fn save(&self, index: &str, settings: &LiveSettings) -> Result<()>;

    /// Load previously saved settings. `Ok(None)` when nothing was saved yet.
    fn load(&self, index: &str) -> Result<Option<LiveSettings>>;
}

/// File-backed store: one `live_settings.json` per index directory.
pub struct JsonSettingsStore {
    root: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn index_dir(&self, index: &str) -> PathBuf {
        self.root.join(index)
    }
}

impl SettingsStore for JsonSettingsStore {
    /// Save atomically: write temp file, then rename. On POSIX, rename is
    /// atomic, so a crash mid-write cannot corrupt the existing file.
    fn save(&self, index: &str, settings: &LiveSettings) -> Result<()> {
        let dir = self.index_dir(index);
        fs::create_dir_all(&dir)?;

        let bytes =
            serde_json::to_vec_pretty(settings).map_err(|e| Error::Serialization(e.to_string()))?;
        let tmp_path = dir.join(SETTINGS_TMP_FILENAME);
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, dir.join(SETTINGS_FILENAME))?;
        Ok(())
    }

    /// Load from the index directory.
    ///
    /// If `live_settings.json` is missing but the temp file exists (crash
    /// between write and rename), recovers from the temp file.
    fn load(&self, index: &str) -> Result<Option<LiveSettings>> {
        let dir = self.index_dir(index);
        let bytes = match fs::read(dir.join(SETTINGS_FILENAME)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match fs::read(dir.join(SETTINGS_TMP_FILENAME)) {
                    Ok(bytes) => {
                        log::warn!(
                            "[settings_store] recovered {} settings from temp file (previous crash during save)",
                            index
                        );
                        bytes
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let settings =
            serde_json::from_slice(&bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Some(settings))
    }
}
