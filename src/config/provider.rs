// Provider selection
//
// Turns the string-keyed `llm_config.client` section into a closed
// `ProviderName` plus fully-defaulted `ProviderSettings`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
use super::settings::{ClientConfig, ProviderBlock};
use crate::errors::ConfigError;

/// Every provider name the config may select.
///
/// `Slip` is recognised but has no client; selecting it is a
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    OpenAi,
    Bedrock,
    Gemini,
    Slip,
}

impl ProviderName {
    pub const ALL: [ProviderName; 4] = [
        ProviderName::OpenAi,
        ProviderName::Bedrock,
        ProviderName::Gemini,
        ProviderName::Slip,
    ];

    /// Short lowercase tag, also the config block key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Bedrock => "bedrock",
            Self::Gemini => "gemini",
            Self::Slip => "slip",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "OPENAI" => Ok(Self::OpenAi),
            "BEDROCK" => Ok(Self::Bedrock),
            "GEMINI" => Ok(Self::Gemini),
            "SLIP" => Ok(Self::Slip),
            _ => Err(ConfigError::UnsupportedProvider { name: upper }),
        }
    }
}

/// Resolved settings for the selected provider, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub provider: ProviderName,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub max_retries: u32,
    pub base_url: Option<String>,
    pub region: Option<String>,
    /// Explicit key; when `None` the client reads its provider's env var
    pub api_key: Option<String>,
}

impl ProviderSettings {
    /// Apply defaults to a provider block.
    ///
    /// Bedrock reads its token limit from `max_gen_len`; the others from
    /// `max_output_tokens`.
    pub fn from_block(provider: ProviderName, block: &ProviderBlock) -> Self {
        let params = &block.model_params;
        let max_tokens = match provider {
            ProviderName::Bedrock => params.max_gen_len.or(params.max_output_tokens),
            _ => params.max_output_tokens,
        };

        Self {
            provider,
            model: block.model_name.clone(),
            temperature: params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            top_p: params.top_p.unwrap_or(DEFAULT_TOP_P),
            max_retries: params.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            base_url: block.base_url.clone(),
            region: block.region.clone(),
            api_key: None,
        }
    }

    /// Minimal settings for a model with every parameter defaulted
    pub fn with_defaults(provider: ProviderName, model: impl Into<String>) -> Self {
        let block = ProviderBlock {
            model_name: model.into(),
            model_params: Default::default(),
            base_url: None,
            region: None,
        };
        Self::from_block(provider, &block)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl ClientConfig {
    /// Parse `name` into a provider.
    pub fn provider_name(&self) -> Result<ProviderName, ConfigError> {
        self.name.parse()
    }

    fn block(&self, provider: ProviderName) -> Option<&ProviderBlock> {
        match provider {
            ProviderName::OpenAi => self.openai.as_ref(),
            ProviderName::Bedrock => self.bedrock.as_ref(),
            ProviderName::Gemini => self.gemini.as_ref(),
            ProviderName::Slip => self.slip.as_ref(),
        }
    }

    /// Settings for the selected provider.
    ///
    /// `Slip` is rejected here, before its block is even looked at.
    pub fn provider_settings(&self) -> Result<ProviderSettings, ConfigError> {
        let provider = self.provider_name()?;
        if provider == ProviderName::Slip {
            return Err(ConfigError::NotImplemented {
                provider: "SLIP".to_string(),
            });
        }
        let block = self
            .block(provider)
            .ok_or_else(|| ConfigError::MissingProviderBlock {
                provider: provider.as_str().to_string(),
            })?;
        Ok(ProviderSettings::from_block(provider, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelParams;

    fn client(name: &str) -> ClientConfig {
        ClientConfig {
            name: name.to_string(),
            openai: Some(ProviderBlock {
                model_name: "gpt-4o".to_string(),
                model_params: ModelParams {
                    temperature: Some(0.2),
                    max_retries: Some(5),
                    max_output_tokens: Some(1024),
                    max_gen_len: None,
                    top_p: Some(0.9),
                },
                base_url: None,
                region: None,
            }),
            bedrock: Some(ProviderBlock {
                model_name: "meta.llama3-70b-instruct-v1:0".to_string(),
                model_params: ModelParams {
                    max_gen_len: Some(512),
                    ..Default::default()
                },
                base_url: None,
                region: Some("eu-west-1".to_string()),
            }),
            gemini: None,
            slip: None,
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("openai".parse::<ProviderName>().unwrap(), ProviderName::OpenAi);
        assert_eq!("Bedrock".parse::<ProviderName>().unwrap(), ProviderName::Bedrock);
        assert_eq!("GEMINI".parse::<ProviderName>().unwrap(), ProviderName::Gemini);
        assert_eq!("slip".parse::<ProviderName>().unwrap(), ProviderName::Slip);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "FOO".parse::<ProviderName>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider { ref name } if name == "FOO"));
    }

    #[test]
    fn test_as_str_round_trips() {
        for provider in ProviderName::ALL {
            assert_eq!(provider.as_str().parse::<ProviderName>().unwrap(), provider);
        }
    }

    #[test]
    fn test_explicit_params() {
        let settings = client("OpenAI").provider_settings().unwrap();
        assert_eq!(settings.provider, ProviderName::OpenAi);
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.max_tokens, 1024);
        assert_eq!(settings.top_p, 0.9);
        assert_eq!(settings.max_retries, 5);
    }

    #[test]
    fn test_bedrock_uses_max_gen_len_and_defaults() {
        let settings = client("bedrock").provider_settings().unwrap();
        assert_eq!(settings.max_tokens, 512);
        assert_eq!(settings.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(settings.top_p, DEFAULT_TOP_P);
        assert_eq!(settings.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_missing_block() {
        let err = client("gemini").provider_settings().unwrap_err();
        assert!(matches!(err, ConfigError::MissingProviderBlock { .. }));
    }

    #[test]
    fn test_slip_not_implemented() {
        let err = client("slip").provider_settings().unwrap_err();
        assert!(matches!(err, ConfigError::NotImplemented { .. }));
    }

    #[test]
    fn test_with_defaults() {
        let settings = ProviderSettings::with_defaults(ProviderName::Gemini, "gemini-1.5-pro");
        assert_eq!(settings.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.top_p, 1.0);
        assert_eq!(settings.max_retries, 3);
        assert!(settings.base_url.is_none());
    }
}
