use crate::error::ChorusError;
use crate::log_debug;
use crate::models;

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// File in the working directory holding the API key when the environment has none
pub const KEY_FILE_NAME: &str = ".openai_key";
/// Settings file name under `<config_dir>/chorus/`
pub const SETTINGS_FILE_NAME: &str = "config.toml";

pub const DEFAULT_MAX_TOKENS: u32 = 100;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MAX_TOKENS: &str = "MAX_TOKENS";
pub const ENV_PROMPT_PREFIX: &str = "PROMPT_PREFIX";
pub const ENV_PINNED_MODEL: &str = "CHORUS_MODEL";
pub const ENV_MODELS: &str = "CHORUS_MODELS";
pub const ENV_JUDGE_MODEL: &str = "CHORUS_JUDGE_MODEL";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CHORUS_TIMEOUT_SECS";

/// Read-only configuration for one invocation.
///
/// Built once by [`Config::load`] and shared by reference; nothing else in the
/// crate reads the environment or the filesystem for settings.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Bearer credential for the remote service
    pub api_key: String,
    /// Token budget for raw-completion calls
    pub max_tokens: u32,
    /// Text prepended to every prompt
    pub prompt_prefix: String,
    /// When set, only this model is called and the judge is skipped
    pub pinned_model: Option<String>,
    /// Fan-out set, in display order
    pub models: Vec<String>,
    /// Model asked to pick the best answer
    pub judge_model: String,
    /// Service root without a trailing slash
    pub base_url: String,
    /// Per-call timeout
    pub timeout: Duration,
}

/// Optional settings file. Never holds the API key.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub max_tokens: Option<u32>,
    pub prompt_prefix: Option<String>,
    pub pinned_model: Option<String>,
    pub models: Option<Vec<String>>,
    pub judge_model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Values supplied on the command line; they win over every other source
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub max_tokens: Option<u32>,
    pub prompt_prefix: Option<String>,
    pub pinned_model: Option<String>,
    pub models: Option<Vec<String>>,
    pub judge_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Where environment values come from
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    /// Like [`EnvSource::var`] but treats blank values as unset
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The real process environment
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Filesystem locations consulted while loading
#[derive(Clone, Debug)]
pub struct ConfigPaths {
    pub key_file: PathBuf,
    pub settings_file: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from(KEY_FILE_NAME),
            settings_file: Config::settings_path(),
        }
    }
}

impl Config {
    /// Load the configuration from the process environment and default paths
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ChorusError> {
        Self::from_sources(overrides, &ProcessEnv, &ConfigPaths::default())
    }

    /// Load the configuration from explicit sources.
    ///
    /// Priority, highest first: `overrides`, environment, settings file,
    /// built-in defaults. The API key comes only from the environment or the
    /// key file.
    pub fn from_sources(
        overrides: &ConfigOverrides,
        env: &dyn EnvSource,
        paths: &ConfigPaths,
    ) -> Result<Self, ChorusError> {
        let api_key = Self::resolve_api_key(env, &paths.key_file)?;

        let settings = match &paths.settings_file {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let max_tokens = match (overrides.max_tokens, env.non_empty(ENV_MAX_TOKENS)) {
            (Some(value), _) => value,
            (None, Some(raw)) => parse_max_tokens(&raw)?,
            (None, None) => settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        if max_tokens == 0 {
            return Err(ChorusError::InvalidConfig(
                "max tokens must be greater than zero".to_string(),
            ));
        }

        // Prefix keeps its whitespace, so it bypasses `non_empty`
        let prompt_prefix = overrides
            .prompt_prefix
            .clone()
            .or_else(|| env.var(ENV_PROMPT_PREFIX).filter(|v| !v.is_empty()))
            .or(settings.prompt_prefix)
            .unwrap_or_default();

        let pinned_model = overrides
            .pinned_model
            .clone()
            .or_else(|| env.non_empty(ENV_PINNED_MODEL))
            .or(settings.pinned_model)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        // Every source is cleaned the same way; a list with nothing left falls through
        let models = overrides
            .models
            .as_deref()
            .map(clean_models)
            .filter(|m| !m.is_empty())
            .or_else(|| {
                env.non_empty(ENV_MODELS)
                    .map(|raw| split_models(&raw))
                    .filter(|m| !m.is_empty())
            })
            .or_else(|| {
                settings
                    .models
                    .as_deref()
                    .map(clean_models)
                    .filter(|m| !m.is_empty())
            })
            .unwrap_or_else(models::default_models);

        let judge_model = overrides
            .judge_model
            .clone()
            .or_else(|| env.non_empty(ENV_JUDGE_MODEL))
            .or(settings.judge_model)
            .unwrap_or_else(|| models::DEFAULT_JUDGE_MODEL.to_string());

        let base_url = normalize_base_url(
            &env.non_empty(ENV_BASE_URL)
                .or(settings.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let timeout_secs = match (overrides.timeout_secs, env.non_empty(ENV_TIMEOUT_SECS)) {
            (Some(value), _) => value,
            (None, Some(raw)) => raw.parse::<u64>().map_err(|e| {
                ChorusError::InvalidConfig(format!("{ENV_TIMEOUT_SECS}={raw:?}: {e}"))
            })?,
            (None, None) => settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ChorusError::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }

        let config = Self {
            api_key,
            max_tokens,
            prompt_prefix,
            pinned_model,
            models,
            judge_model,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        };

        log_debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Environment first, then the key file
    fn resolve_api_key(env: &dyn EnvSource, key_file: &Path) -> Result<String, ChorusError> {
        if let Some(key) = env.non_empty(ENV_API_KEY) {
            return Ok(key);
        }

        match fs::read_to_string(key_file) {
            Ok(contents) => {
                let key = contents.trim().to_string();
                if key.is_empty() {
                    Err(ChorusError::ConfigUnavailable)
                } else {
                    log_debug!("Using API key from {}", key_file.display());
                    Ok(key)
                }
            }
            Err(e) => {
                log_debug!("No key file at {}: {}", key_file.display(), e);
                Err(ChorusError::ConfigUnavailable)
            }
        }
    }

    /// Path to the optional settings file
    pub fn settings_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("chorus").join(SETTINGS_FILE_NAME))
    }

    /// Endpoint URL for a path relative to the service root
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("prompt_prefix", &self.prompt_prefix)
            .field("pinned_model", &self.pinned_model)
            .field("models", &self.models)
            .field("judge_model", &self.judge_model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    /// Read the settings file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ChorusError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ChorusError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| {
            ChorusError::InvalidConfig(format!(
                "invalid settings file {}: {e}. Please check it for syntax errors.",
                path.display()
            ))
        })?;

        log_debug!("Settings loaded from {}: {:?}", path.display(), settings);
        Ok(settings)
    }
}

fn parse_max_tokens(raw: &str) -> Result<u32, ChorusError> {
    raw.parse::<u32>()
        .map_err(|e| ChorusError::InvalidConfig(format!("{ENV_MAX_TOKENS}={raw:?}: {e}")))
}

/// Split a comma-separated model list, dropping blanks
pub fn split_models(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Trim every identifier and drop the blank ones
pub fn clean_models(models: &[String]) -> Vec<String> {
    models
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn normalize_base_url(raw: &str) -> Result<String, ChorusError> {
    let parsed = Url::parse(raw)
        .map_err(|e| ChorusError::InvalidConfig(format!("base URL {raw:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ChorusError::InvalidConfig(format!(
            "base URL {raw:?} must use http or https"
        )));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn no_files() -> ConfigPaths {
        ConfigPaths {
            key_file: PathBuf::from("/nonexistent/chorus/.openai_key"),
            settings_file: None,
        }
    }

    #[test]
    fn test_defaults_with_env_key() {
        let config = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "sk-test")]),
            &no_files(),
        )
        .expect("config should load");

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(config.prompt_prefix.is_empty());
        assert!(config.pinned_model.is_none());
        assert_eq!(config.models, models::default_models());
        assert_eq!(config.judge_model, models::DEFAULT_JUDGE_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_missing_key_is_config_unavailable() {
        let result = Config::from_sources(&ConfigOverrides::default(), &env(&[]), &no_files());
        assert_eq!(result, Err(ChorusError::ConfigUnavailable));
    }

    #[test]
    fn test_blank_env_key_counts_as_unset() {
        let result = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "   ")]),
            &no_files(),
        );
        assert_eq!(result, Err(ChorusError::ConfigUnavailable));
    }

    #[test]
    fn test_invalid_max_tokens() {
        let result = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "k"), (ENV_MAX_TOKENS, "lots")]),
            &no_files(),
        );
        assert!(matches!(result, Err(ChorusError::InvalidConfig(_))));

        let zero = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "k"), (ENV_MAX_TOKENS, "0")]),
            &no_files(),
        );
        assert!(matches!(zero, Err(ChorusError::InvalidConfig(_))));
    }

    #[test]
    fn test_overrides_beat_env() {
        let overrides = ConfigOverrides {
            max_tokens: Some(42),
            pinned_model: Some("gpt-4".to_string()),
            ..Default::default()
        };
        let config = Config::from_sources(
            &overrides,
            &env(&[
                (ENV_API_KEY, "k"),
                (ENV_MAX_TOKENS, "7"),
                (ENV_PINNED_MODEL, "text-davinci-003"),
            ]),
            &no_files(),
        )
        .expect("config should load");

        assert_eq!(config.max_tokens, 42);
        assert_eq!(config.pinned_model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_models_from_env_list() {
        let config = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "k"), (ENV_MODELS, "gpt-4, ,text-davinci-003")]),
            &no_files(),
        )
        .expect("config should load");
        assert_eq!(config.models, ["gpt-4", "text-davinci-003"]);
    }

    #[test]
    fn test_models_from_overrides_are_cleaned() {
        let overrides = ConfigOverrides {
            models: Some(vec![
                "gpt-4".to_string(),
                String::new(),
                "  ".to_string(),
                " text-davinci-003 ".to_string(),
            ]),
            ..Default::default()
        };
        let config = Config::from_sources(&overrides, &env(&[(ENV_API_KEY, "k")]), &no_files())
            .expect("config should load");
        assert_eq!(config.models, ["gpt-4", "text-davinci-003"]);

        let blank = ConfigOverrides {
            models: Some(vec![String::new(), "  ".to_string()]),
            ..Default::default()
        };
        let config = Config::from_sources(
            &blank,
            &env(&[(ENV_API_KEY, "k"), (ENV_MODELS, "gpt-4")]),
            &no_files(),
        )
        .expect("config should load");
        assert_eq!(config.models, ["gpt-4"]);
    }

    #[test]
    fn test_base_url_normalized() {
        let config = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "k"), (ENV_BASE_URL, "http://localhost:8080/v1/")]),
            &no_files(),
        )
        .expect("config should load");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(
            config.endpoint("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );

        let bad = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "k"), (ENV_BASE_URL, "ftp://example.com")]),
            &no_files(),
        );
        assert!(matches!(bad, Err(ChorusError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::from_sources(
            &ConfigOverrides::default(),
            &env(&[(ENV_API_KEY, "sk-secret")]),
            &no_files(),
        )
        .expect("config should load");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
