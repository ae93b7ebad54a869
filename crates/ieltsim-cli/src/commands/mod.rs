//! CLI subcommand implementations.

use std::sync::Arc;

use anyhow::Result;

use ieltsim_core::traits::ContentProvider;
use ieltsim_providers::config::{create_provider, IeltsimConfig, ProviderConfig};

pub mod generate;
pub mod grade;
pub mod run;
pub mod score;
pub mod validate;

/// Resolve a provider by name from the config. The name "mock" always
/// works, even without a config entry, so offline runs need no setup.
pub(crate) fn resolve_provider(
    config: &IeltsimConfig,
    name: Option<&str>,
) -> Result<Arc<dyn ContentProvider>> {
    let name = name.unwrap_or(&config.default_provider);
    match config.providers.get(name) {
        Some(provider_config) => Ok(Arc::from(create_provider(provider_config)?)),
        None if name == "mock" => Ok(Arc::from(create_provider(&ProviderConfig::Mock)?)),
        None => anyhow::bail!(
            "provider '{}' not found in config. Available: {:?}",
            name,
            config.providers.keys().collect::<Vec<_>>()
        ),
    }
}
