//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ieltsim_core::timer::SECTION_DURATION_SECS;
use ieltsim_core::traits::ContentProvider;

use crate::gemini::GeminiProvider;
use crate::mock::MockContentProvider;

/// Configuration for a single content provider backend.
///
/// Note: custom Debug impl masks API keys to prevent accidental exposure
/// in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    Mock,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            ProviderConfig::Mock => f.debug_struct("Mock").finish(),
        }
    }
}

/// Top-level ieltsim configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IeltsimConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Directory for saved tests and results.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Per-section time limit in seconds.
    #[serde(default = "default_section_secs")]
    pub section_duration_secs: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./ieltsim-results")
}
fn default_section_secs() -> u64 {
    SECTION_DURATION_SECS
}

impl Default for IeltsimConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            output_dir: default_output_dir(),
            section_duration_secs: default_section_secs(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
        },
        ProviderConfig::Mock => ProviderConfig::Mock,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `ieltsim.toml` in the current directory
/// 2. `~/.config/ieltsim/config.toml`
///
/// Environment variable override: `GEMINI_API_KEY`.
pub fn load_config() -> Result<IeltsimConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<IeltsimConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("ieltsim.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            global.exists().then_some(global)
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<IeltsimConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => IeltsimConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
                model: None,
            });
        if let Some(ProviderConfig::Gemini { api_key, .. }) = config.providers.get_mut("gemini") {
            *api_key = key;
        }
    }

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ieltsim"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn ContentProvider>> {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            model,
        } => {
            anyhow::ensure!(
                !api_key.is_empty(),
                "gemini provider requires an api_key (or GEMINI_API_KEY)"
            );
            Ok(Box::new(GeminiProvider::new(
                api_key,
                base_url.clone(),
                model.clone(),
            )))
        }
        ProviderConfig::Mock => Ok(Box::new(MockContentProvider::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_IELTSIM_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_IELTSIM_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_IELTSIM_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_IELTSIM_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = IeltsimConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.section_duration_secs, 3600);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "gemini"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"
model = "gemini-2.5-flash"

[providers.offline]
type = "mock"
"#;
        let config: IeltsimConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert!(matches!(
            config.providers.get("gemini"),
            Some(ProviderConfig::Gemini { .. })
        ));
        assert!(matches!(
            config.providers.get("offline"),
            Some(ProviderConfig::Mock)
        ));
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
            model: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn missing_explicit_config_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn creating_gemini_without_key_fails() {
        let config = ProviderConfig::Gemini {
            api_key: String::new(),
            base_url: None,
            model: None,
        };
        assert!(create_provider(&config).is_err());
    }
}
