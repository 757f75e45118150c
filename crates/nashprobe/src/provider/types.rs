use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::RawReply;

/// Supported text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Anthropic,
    OpenAi,
    Google,
    Mistral,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Anthropic,
        ProviderId::OpenAi,
        ProviderId::Google,
        ProviderId::Mistral,
    ];

    /// Canonical lowercase name (also the config table key).
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAi => "openai",
            ProviderId::Google => "google",
            ProviderId::Mistral => "mistral",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        super::default::default_provider_aliases()
            .get(key.as_str())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown provider '{}'", s.trim()))
    }
}

/// System and user prompt pair sent for a single decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Call settings for one provider, resolved from defaults and user config.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub id: ProviderId,
    pub model: String,
    /// API root override; `None` uses the provider default.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub api_key: Option<String>,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Issue one request and return the text payload untouched.
    ///
    /// Errors are transport or vendor failures; malformed reply text is not
    /// an error.
    async fn complete(&self, prompt: &Prompt) -> anyhow::Result<RawReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_provider_names_and_aliases() {
        assert_eq!("anthropic".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert_eq!(" Claude ".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert_eq!("OpenAI".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert_eq!("gemini".parse::<ProviderId>().unwrap(), ProviderId::Google);
        assert_eq!("mistral".parse::<ProviderId>().unwrap(), ProviderId::Mistral);
        let err = "llama".parse::<ProviderId>().unwrap_err();
        assert!(err.to_string().contains("llama"));
    }

    #[test]
    fn canonical_names_round_trip_through_display() {
        for id in ProviderId::ALL {
            assert_eq!(id.to_string().parse::<ProviderId>().unwrap(), id);
        }
    }
}
