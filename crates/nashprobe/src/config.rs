//! User configuration loaded from `<home>/config.toml`.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! to_file = false
//!
//! [providers.claude]
//! model = "claude-3-7-sonnet-20250219"
//! api_key_env = "MY_ANTHROPIC_KEY"
//!
//! [providers.gemini]
//! temperature = 0.2
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use crate::provider::{ProviderId, ProviderSettings};
use crate::provider::default::{default_api_key_env, default_settings};

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    /// Keyed by provider name or alias (`claude`, `gemini`, ...).
    pub providers: Option<BTreeMap<String, ProviderCfg>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProviderCfg {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Inline key; takes precedence over any environment variable.
    pub api_key: Option<String>,
    /// Name of the env var holding the key, replacing the provider default.
    pub api_key_env: Option<String>,
}

pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg = parse_user_config(&s).with_context(|| format!("invalid {}", path.display()))?;
    Ok(Some(cfg))
}

pub fn parse_user_config(s: &str) -> anyhow::Result<UserConfig> {
    Ok(toml::from_str(s)?)
}

impl UserConfig {
    /// Config entry for `id`, matching table keys by provider alias.
    pub fn provider_cfg(&self, id: ProviderId) -> Option<&ProviderCfg> {
        let providers = self.providers.as_ref()?;
        let mut found = None;
        for (key, cfg) in providers {
            match key.parse::<ProviderId>() {
                Ok(k) if k == id => {
                    if found.is_some() {
                        tracing::warn!("duplicate [providers] entries for {}; using '{}'", id, key);
                    }
                    found = Some(cfg);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("ignoring [providers.{}]: {}", key, e),
            }
        }
        found
    }

    /// Resolve call settings for `id`: built-in defaults, overlaid with
    /// config, with credentials resolved through `env`.
    pub fn provider_settings_with<F>(&self, id: ProviderId, env: F) -> ProviderSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = default_settings(id);
        let cfg = self.provider_cfg(id).cloned().unwrap_or_default();
        if let Some(m) = cfg.model {
            settings.model = m;
        }
        if let Some(u) = cfg.base_url {
            settings.base_url = Some(u);
        }
        if let Some(t) = cfg.temperature {
            settings.temperature = t;
        }
        if let Some(n) = cfg.max_output_tokens {
            settings.max_output_tokens = Some(n);
        }
        settings.api_key = match cfg.api_key.filter(|k| !k.trim().is_empty()) {
            Some(k) => Some(k),
            None => {
                let var = cfg
                    .api_key_env
                    .unwrap_or_else(|| default_api_key_env(id).to_string());
                let key = env(&var).filter(|k| !k.trim().is_empty());
                if key.is_none() {
                    tracing::debug!("no API key for {} (checked {})", id, var);
                }
                key
            }
        };
        settings
    }

    /// Same as [`Self::provider_settings_with`], reading the process environment.
    pub fn provider_settings(&self, id: ProviderId) -> ProviderSettings {
        self.provider_settings_with(id, |k| std::env::var(k).ok())
    }
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_user_config(dir.path()).expect("load ok");
        assert!(cfg.is_none());
    }

    #[test]
    fn load_logging_and_providers_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[logging]
level = "debug"
to_file = false

[providers.claude]
model = "claude-sonnet-4"
api_key = "sk-inline"

[providers.gemini]
temperature = 0.2
api_key_env = "MY_GEMINI"
"#,
        )
        .expect("write");
        let cfg = load_user_config(dir.path()).expect("load ok").expect("some");
        let logging = cfg.logging.as_ref().expect("logging");
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.to_file, Some(false));

        let anth = cfg.provider_settings_with(ProviderId::Anthropic, no_env);
        assert_eq!(anth.model, "claude-sonnet-4");
        assert_eq!(anth.api_key.as_deref(), Some("sk-inline"));
        assert_eq!(anth.max_output_tokens, Some(1500));

        let gem = cfg.provider_settings_with(ProviderId::Google, |k| {
            (k == "MY_GEMINI").then(|| "g-key".to_string())
        });
        assert_eq!(gem.temperature, 0.2);
        assert_eq!(gem.model, "gemini-2.0-flash");
        assert_eq!(gem.api_key.as_deref(), Some("g-key"));
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.toml"), "[logging\nlevel=").expect("write");
        let err = load_user_config(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }

    #[test]
    fn defaults_use_conventional_env_var() {
        let cfg = UserConfig::default();
        let s = cfg.provider_settings_with(ProviderId::Mistral, |k| {
            (k == "MISTRAL_API_KEY").then(|| "m-key".to_string())
        });
        assert_eq!(s.model, "mistral-small-latest");
        assert_eq!(s.api_key.as_deref(), Some("m-key"));

        let s = cfg.provider_settings_with(ProviderId::OpenAi, |_| Some("  ".to_string()));
        assert!(s.api_key.is_none());
    }

    #[test]
    fn unknown_provider_tables_are_ignored() {
        let cfg = parse_user_config(
            r#"
[providers.llama]
model = "x"
[providers.openai]
model = "gpt-4.1"
"#,
        )
        .expect("parse ok");
        assert_eq!(
            cfg.provider_settings_with(ProviderId::OpenAi, no_env).model,
            "gpt-4.1"
        );
        assert!(cfg.provider_cfg(ProviderId::Mistral).is_none());
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/log"), PathBuf::from("/var/log"));
    }
}
