//! Iris core — per-index live state for the iris search server.
//!
//! This crate owns the state side of runtime index tuning:
//! - `LiveSettings` - sparse, immutable settings values with per-field defaults
//! - `IndexState` - generation-numbered snapshot with effective-value accessors
//! - `IndexStateManager` - single-writer installs, lock-free snapshot reads
//! - `SettingsStore` - durable storage seam with a JSON file implementation
//!
//! The request-facing side (sentinel decoding, merge protocol, rendering)
//! lives in `iris-server`.

pub mod error;
pub mod live_settings;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use live_settings::{LiveSettings, defaults};
pub use state::{IndexState, IndexStateManager, SettingsWriteGuard};
pub use store::{JsonSettingsStore, SETTINGS_FILENAME, SettingsStore};
