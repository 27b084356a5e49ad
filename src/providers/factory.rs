// Provider factory
//
// Creates LLM providers from the resolved client configuration

use anyhow::Result;

use super::bedrock::BedrockProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAIProvider;
use super::LlmProvider;
use crate::config::{ClientConfig, ProviderName, ProviderSettings};
use crate::errors::ConfigError;

type ProviderConstructor = fn(&ProviderSettings) -> Result<Box<dyn LlmProvider>>;

fn openai(settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>> {
    Ok(Box::new(OpenAIProvider::from_settings(settings)?))
}

fn bedrock(settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>> {
    Ok(Box::new(BedrockProvider::from_settings(settings)?))
}

fn gemini(settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>> {
    Ok(Box::new(GeminiProvider::from_settings(settings)?))
}

/// Provider name -> constructor. Names absent here are recognised but
/// have no client.
const CONSTRUCTORS: &[(ProviderName, ProviderConstructor)] = &[
    (ProviderName::OpenAi, openai as ProviderConstructor),
    (ProviderName::Bedrock, bedrock as ProviderConstructor),
    (ProviderName::Gemini, gemini as ProviderConstructor),
];

/// Create an `LlmProvider` for already-resolved settings.
pub fn create_provider(settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>> {
    let constructor = CONSTRUCTORS
        .iter()
        .find(|(name, _)| *name == settings.provider)
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| ConfigError::NotImplemented {
            provider: settings.provider.as_str().to_ascii_uppercase(),
        })?;

    let provider = constructor(settings)?;
    tracing::debug!(
        "Created {} provider for model {}",
        provider.name(),
        provider.default_model()
    );
    Ok(provider)
}

/// Select and build the provider named by `llm_config.client.name`.
///
/// Unknown names fail with `UnsupportedProvider` before any client is built.
pub fn create_provider_from_config(client: &ClientConfig) -> Result<Box<dyn LlmProvider>> {
    let settings = client.provider_settings()?;
    create_provider(&settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelParams, ProviderBlock};

    fn block(model: &str) -> ProviderBlock {
        ProviderBlock {
            model_name: model.to_string(),
            model_params: ModelParams::default(),
            base_url: Some("http://localhost:1".to_string()),
            region: None,
        }
    }

    fn client(name: &str) -> ClientConfig {
        ClientConfig {
            name: name.to_string(),
            openai: Some(block("gpt-4o-mini")),
            bedrock: Some(block("anthropic.claude-3-haiku-20240307-v1:0")),
            gemini: Some(block("gemini-1.5-flash")),
            slip: Some(block("slip-1")),
        }
    }

    #[test]
    fn test_unknown_name_is_unsupported() {
        let err = create_provider_from_config(&client("foo")).err().unwrap();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::UnsupportedProvider { name }) => assert_eq!(name, "FOO"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_slip_is_not_implemented() {
        let err = create_provider_from_config(&client("slip")).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotImplemented { .. })
        ));
        assert_eq!(err.to_string(), "SLIP client not implemented yet");
    }

    #[test]
    fn test_every_implemented_provider_builds() {
        for name in ["OpenAI", "bedrock", "GEMINI"] {
            let settings = client(name).provider_settings().unwrap().with_api_key("key");
            let provider = create_provider(&settings).unwrap();
            assert_eq!(provider.name(), settings.provider.as_str());
            assert_eq!(provider.default_model(), settings.model);
        }
    }

    #[test]
    fn test_every_name_has_a_table_entry_or_is_slip() {
        for name in ProviderName::ALL {
            let in_table = CONSTRUCTORS.iter().any(|(n, _)| *n == name);
            assert_eq!(in_table, name != ProviderName::Slip, "{}", name);
        }
    }
}
