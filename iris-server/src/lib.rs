//! Iris server — handler layer for the live settings API.
//!
//! The service impls here expose the `Request -> Result<Response, Status>`
//! surface a tonic transport mounts; transport bootstrap and request routing
//! live with the embedding binary. Index existence is resolved here, before
//! any lock is taken.

pub mod error;
pub mod proto;
pub mod registry;
pub mod settings_service;

pub use registry::IndexRegistry;
pub use settings_service::SettingsServiceImpl;
