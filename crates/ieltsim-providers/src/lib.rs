//! ieltsim-providers — content provider integrations.
//!
//! Implements the `ContentProvider` trait for the Gemini API, plus a
//! deterministic mock backend for tests and offline runs.

pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;

pub use config::{create_provider, load_config, IeltsimConfig, ProviderConfig};
pub use error::ProviderError;
