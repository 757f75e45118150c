use std::collections::HashMap;

use super::types::{ProviderId, ProviderSettings};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Lowercased alias -> provider.
pub fn default_provider_aliases() -> HashMap<&'static str, ProviderId> {
    let mut m = HashMap::new();
    for (alias, id) in [
        ("anthropic", ProviderId::Anthropic),
        ("claude", ProviderId::Anthropic),
        ("openai", ProviderId::OpenAi),
        ("open_ai", ProviderId::OpenAi),
        ("gpt", ProviderId::OpenAi),
        ("chatgpt", ProviderId::OpenAi),
        ("google", ProviderId::Google),
        ("gemini", ProviderId::Google),
        ("mistral", ProviderId::Mistral),
        ("mistralai", ProviderId::Mistral),
    ] {
        m.insert(alias, id);
    }
    m
}

/// Environment variable conventionally holding the provider's API key.
pub fn default_api_key_env(id: ProviderId) -> &'static str {
    match id {
        ProviderId::Anthropic => "ANTHROPIC_API_KEY",
        ProviderId::OpenAi => "OPENAI_API_KEY",
        ProviderId::Google => "GEMINI_API_KEY",
        ProviderId::Mistral => "MISTRAL_API_KEY",
    }
}

/// API root used when settings carry no `base_url` override.
pub fn default_base_url(id: ProviderId) -> &'static str {
    match id {
        ProviderId::Anthropic => "https://api.anthropic.com/v1/",
        ProviderId::OpenAi => "https://api.openai.com/v1/",
        ProviderId::Google => "https://generativelanguage.googleapis.com/v1beta/openai/",
        ProviderId::Mistral => "https://api.mistral.ai/v1/",
    }
}

/// Built-in call settings per provider, without credentials.
pub fn default_settings(id: ProviderId) -> ProviderSettings {
    let (model, base_url, max_output_tokens) = match id {
        ProviderId::Anthropic => ("claude-3-7-sonnet-20250219", None, Some(1500)),
        ProviderId::OpenAi => ("gpt-4o", None, Some(1024)),
        ProviderId::Google => (
            "gemini-2.0-flash",
            Some("https://generativelanguage.googleapis.com/v1beta/openai/"),
            None,
        ),
        ProviderId::Mistral => ("mistral-small-latest", None, None),
    };
    ProviderSettings {
        id,
        model: model.to_string(),
        base_url: base_url.map(|s| s.to_string()),
        temperature: DEFAULT_TEMPERATURE,
        max_output_tokens,
        api_key: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_defaults() {
        for id in ProviderId::ALL {
            let s = default_settings(id);
            assert_eq!(s.id, id);
            assert!(!s.model.is_empty());
            assert_eq!(s.temperature, DEFAULT_TEMPERATURE);
            assert!(s.api_key.is_none());
            assert!(default_api_key_env(id).ends_with("_API_KEY"));
        }
        assert!(default_settings(ProviderId::Google).base_url.is_some());
        assert_eq!(
            default_settings(ProviderId::Anthropic).max_output_tokens,
            Some(1500)
        );
    }

    #[test]
    fn base_urls_are_https_roots() {
        for id in ProviderId::ALL {
            let url = default_base_url(id);
            assert!(url.starts_with("https://") && url.ends_with('/'), "{url}");
        }
        assert_eq!(
            default_settings(ProviderId::Google).base_url.as_deref(),
            Some(default_base_url(ProviderId::Google))
        );
    }

    #[test]
    fn canonical_names_are_aliases() {
        let aliases = default_provider_aliases();
        for id in ProviderId::ALL {
            assert_eq!(aliases.get(id.as_str()), Some(&id));
        }
    }
}
